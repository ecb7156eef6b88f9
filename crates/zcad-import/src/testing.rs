//! 测试用的脚本化几何内核

use crate::error::KernelError;
use crate::format::FileFormat;
use crate::kernel::{
    DocHandle, GltfOptions, Kernel, KernelResult, KernelVersion, Label, NamedShape, ReaderOptions,
    StepWriteOptions, TransferStatus,
};
use crate::settings::IgesHeader;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use zcad_core::math::Placement;

/// 登记在模拟内核中的文件内容
#[derive(Debug, Clone, Default)]
pub struct MockFile {
    pub labels: Vec<Label>,
    /// 颜色表损坏：转换时抛出结构性错误
    pub corrupt_colors: bool,
    /// 读取状态不是 Done
    pub unreadable: bool,
}

#[derive(Debug, Default)]
struct MockState {
    next_handle: u64,
    /// 打开的暂存文档及其标签
    open: BTreeMap<u64, Vec<Label>>,
    /// 句柄上等待转换的文件
    pending: HashMap<u64, PathBuf>,
    files: HashMap<PathBuf, MockFile>,
    reader_options: Vec<ReaderOptions>,
    step_options: Vec<StepWriteOptions>,
    iges_headers: Vec<IgesHeader>,
    gltf_options: Vec<GltfOptions>,
    assembly_updates: usize,
    writes: usize,
}

/// 模拟内核：文件内容预先登记，写出的文件会以确定的文本落盘并可再次读取
#[derive(Debug)]
pub struct MockKernel {
    pub version: KernelVersion,
    pub step_status: TransferStatus,
    pub iges_ok: bool,
    pub gltf_ok: bool,
    state: RefCell<MockState>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            version: KernelVersion::new(7, 8, 0),
            step_status: TransferStatus::Done,
            iges_ok: true,
            gltf_ok: true,
            state: RefCell::new(MockState::default()),
        }
    }

    pub fn with_version(mut self, major: u32, minor: u32) -> Self {
        self.version = KernelVersion::new(major, minor, 0);
        self
    }

    pub fn register(&self, path: impl Into<PathBuf>, file: MockFile) {
        self.state.borrow_mut().files.insert(path.into(), file);
    }

    pub fn register_labels(&self, path: impl Into<PathBuf>, labels: Vec<Label>) {
        self.register(
            path,
            MockFile {
                labels,
                ..MockFile::default()
            },
        );
    }

    pub fn open_handles(&self) -> usize {
        self.state.borrow().open.len()
    }

    pub fn reader_options(&self) -> Vec<ReaderOptions> {
        self.state.borrow().reader_options.clone()
    }

    pub fn step_options(&self) -> Vec<StepWriteOptions> {
        self.state.borrow().step_options.clone()
    }

    pub fn iges_headers(&self) -> Vec<IgesHeader> {
        self.state.borrow().iges_headers.clone()
    }

    pub fn gltf_options(&self) -> Vec<GltfOptions> {
        self.state.borrow().gltf_options.clone()
    }

    pub fn assembly_updates(&self) -> usize {
        self.state.borrow().assembly_updates
    }

    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    /// 写出的文件内容及其标签
    pub fn written_labels(&self, path: &Path) -> Option<Vec<Label>> {
        self.state
            .borrow()
            .files
            .get(path)
            .map(|f| f.labels.clone())
    }

    fn staged(&self, doc: DocHandle) -> KernelResult<Vec<Label>> {
        self.state
            .borrow()
            .open
            .get(&doc.0)
            .cloned()
            .ok_or_else(|| KernelError::Failure(format!("invalid document handle {}", doc.0)))
    }

    fn persist(&self, doc: DocHandle, path: &Path, kind: &str) -> KernelResult<()> {
        let labels = self.staged(doc)?;
        let body = format!("MOCK-{}\n{:#?}\n", kind, labels);
        std::fs::write(path, body).map_err(|e| KernelError::Failure(e.to_string()))?;
        let mut state = self.state.borrow_mut();
        state.writes += 1;
        state.files.insert(
            path.to_path_buf(),
            MockFile {
                labels,
                ..MockFile::default()
            },
        );
        Ok(())
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn flatten(labels: &[Label], parent: &Placement, out: &mut Vec<NamedShape>) {
    for label in labels {
        let placement = parent * label.placement;
        if let Some(shape) = &label.shape {
            out.push(NamedShape {
                name: label.name.clone(),
                shape: shape.transformed(&placement),
            });
        }
        flatten(&label.children, &placement, out);
    }
}

impl Kernel for MockKernel {
    fn name(&self) -> &str {
        "mock"
    }

    fn version(&self) -> KernelVersion {
        self.version
    }

    fn open_document(&self) -> KernelResult<DocHandle> {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = state.next_handle;
        state.open.insert(handle, Vec::new());
        Ok(DocHandle(handle))
    }

    fn close_document(&self, doc: DocHandle) {
        let mut state = self.state.borrow_mut();
        state.open.remove(&doc.0);
        state.pending.remove(&doc.0);
    }

    fn read_file(
        &self,
        doc: DocHandle,
        _format: FileFormat,
        path: &Path,
        options: &ReaderOptions,
    ) -> KernelResult<TransferStatus> {
        let mut state = self.state.borrow_mut();
        state.reader_options.push(*options);
        let readable = state.files.get(path).is_some_and(|f| !f.unreadable);
        if !readable {
            return Ok(TransferStatus::Error);
        }
        state.pending.insert(doc.0, path.to_path_buf());
        Ok(TransferStatus::Done)
    }

    fn transfer(&self, doc: DocHandle) -> KernelResult<()> {
        let mut state = self.state.borrow_mut();
        let path = state
            .pending
            .remove(&doc.0)
            .ok_or_else(|| KernelError::Failure("nothing to transfer".into()))?;
        let file = state.files.get(&path).cloned().unwrap_or_default();
        if file.corrupt_colors {
            return Err(KernelError::Structural(
                "access violation while reading colour table".into(),
            ));
        }
        let visible_only = state
            .reader_options
            .last()
            .and_then(|o| o.read_visible_only)
            .unwrap_or(false);
        let labels: Vec<Label> = file
            .labels
            .into_iter()
            .filter(|l| l.visible || !visible_only)
            .collect();
        state.open.insert(doc.0, labels);
        Ok(())
    }

    fn labels(&self, doc: DocHandle) -> KernelResult<Vec<Label>> {
        self.staged(doc)
    }

    fn read_shapes(&self, _format: FileFormat, path: &Path) -> KernelResult<Vec<NamedShape>> {
        let state = self.state.borrow();
        let file = state
            .files
            .get(path)
            .ok_or_else(|| KernelError::Failure(format!("cannot open {}", path.display())))?;
        let mut out = Vec::new();
        flatten(&file.labels, &Placement::identity(), &mut out);
        Ok(out)
    }

    fn add_labels(&self, doc: DocHandle, labels: Vec<Label>) -> KernelResult<()> {
        let mut state = self.state.borrow_mut();
        let staged = state
            .open
            .get_mut(&doc.0)
            .ok_or_else(|| KernelError::Failure(format!("invalid document handle {}", doc.0)))?;
        staged.extend(labels);
        Ok(())
    }

    fn update_assemblies(&self, _doc: DocHandle) -> KernelResult<()> {
        self.state.borrow_mut().assembly_updates += 1;
        Ok(())
    }

    fn write_step(
        &self,
        doc: DocHandle,
        path: &Path,
        options: &StepWriteOptions,
    ) -> KernelResult<TransferStatus> {
        self.state.borrow_mut().step_options.push(options.clone());
        if self.step_status != TransferStatus::Done {
            return Ok(self.step_status);
        }
        self.persist(doc, path, "STEP")?;
        Ok(TransferStatus::Done)
    }

    fn write_iges(&self, doc: DocHandle, path: &Path, header: &IgesHeader) -> KernelResult<bool> {
        self.state.borrow_mut().iges_headers.push(header.clone());
        if !self.iges_ok {
            return Ok(false);
        }
        self.persist(doc, path, "IGES")?;
        Ok(true)
    }

    fn write_gltf(&self, doc: DocHandle, path: &Path, options: &GltfOptions) -> KernelResult<bool> {
        self.state.borrow_mut().gltf_options.push(options.clone());
        if !self.gltf_ok {
            return Ok(false);
        }
        self.persist(doc, path, "GLTF")?;
        Ok(true)
    }
}
