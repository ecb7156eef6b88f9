//! 几何内核接口
//!
//! STEP/IGES 的解析与写出、glTF 三角化都由外部几何内核完成。桥接层只负责
//! 配置读写器（颜色/名称/图层模式、文件头、坐标系等），并在内核的暂存文档
//! 与宿主文档之间搬运标签。
//!
//! 每次调用恰好打开一个暂存文档，由 [`StagingDocument`] 在离开作用域时关闭，
//! 无论调用成功与否。

use crate::error::KernelError;
use crate::format::FileFormat;
use crate::settings::{IgesHeader, StepHeader};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use zcad_core::math::Placement;
use zcad_core::object::{DocumentObject, ObjectKind};
use zcad_core::properties::Color;
use zcad_core::shape::Shape;

pub type KernelResult<T> = Result<T, KernelError>;

/// 内核版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KernelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl KernelVersion {
    /// 首个支持 glTF 写出的版本
    pub const GLTF: KernelVersion = KernelVersion::new(7, 5, 0);
    /// 首个支持并行 glTF 三角化的版本
    pub const PARALLEL_GLTF: KernelVersion = KernelVersion::new(7, 7, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn supports_gltf(&self) -> bool {
        *self >= Self::GLTF
    }

    pub fn supports_parallel_gltf(&self) -> bool {
        *self >= Self::PARALLEL_GLTF
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// 读写操作的返回状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Void,
    Done,
    Error,
    Fail,
    Stop,
}

impl TransferStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TransferStatus::Error | TransferStatus::Fail | TransferStatus::Stop
        )
    }
}

/// 暂存文档句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocHandle(pub u64);

/// 标签放置的解释方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    /// 绝对放置（自由形状）
    Absolute,
    /// 相对父装配的显式放置
    #[default]
    Explicit,
}

/// 暂存文档中的标签：零件（带形状）或装配（带子标签）
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub shape: Option<Shape>,
    pub placement: Placement,
    pub placement_mode: PlacementMode,
    pub color: Option<Color>,
    /// 逐面颜色
    pub face_colors: Vec<Color>,
    pub layer: Option<String>,
    pub visible: bool,
    pub children: Vec<Label>,
}

impl Label {
    pub fn part(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape: Some(shape),
            placement: Placement::identity(),
            placement_mode: PlacementMode::default(),
            color: None,
            face_colors: Vec::new(),
            layer: None,
            visible: true,
            children: Vec::new(),
        }
    }

    pub fn assembly(name: impl Into<String>, children: Vec<Label>) -> Self {
        Self {
            name: name.into(),
            shape: None,
            placement: Placement::identity(),
            placement_mode: PlacementMode::default(),
            color: None,
            face_colors: Vec::new(),
            layer: None,
            visible: true,
            children,
        }
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_face_colors(mut self, colors: Vec<Color>) -> Self {
        self.face_colors = colors;
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn is_assembly(&self) -> bool {
        self.shape.is_none()
    }

    /// 标签树中的零件数
    pub fn part_count(&self) -> usize {
        let own = usize::from(self.shape.is_some());
        own + self.children.iter().map(Label::part_count).sum::<usize>()
    }
}

/// 无颜色读取得到的形状
#[derive(Debug, Clone, PartialEq)]
pub struct NamedShape {
    pub name: String,
    pub shape: Shape,
}

/// 读取器配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    pub color_mode: bool,
    pub name_mode: bool,
    pub layer_mode: bool,
    /// 仅读取可见实体（IGES）
    pub read_visible_only: Option<bool>,
}

impl ReaderOptions {
    /// 保留颜色、名称和图层
    pub fn full() -> Self {
        Self {
            color_mode: true,
            name_mode: true,
            layer_mode: true,
            read_visible_only: None,
        }
    }
}

/// STEP 写出配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepWriteOptions {
    /// 以装配结构写出
    pub assembly_mode: bool,
    pub header: StepHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    Zup,
    Yup,
}

/// glTF 节点变换的写法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformFormat {
    /// 单位变换省略，纯平移/旋转写为 TRS，其余写为矩阵
    Compact,
    Mat4,
    Trs,
}

/// glTF 写出配置
#[derive(Debug, Clone, PartialEq)]
pub struct GltfOptions {
    pub binary: bool,
    /// 输入长度单位（米），模型以毫米建模时为 0.001
    pub input_length_unit: f64,
    pub input_coordinate_system: CoordinateSystem,
    pub transform_format: TransformFormat,
    pub parallel: bool,
    pub metadata: BTreeMap<String, String>,
}

impl GltfOptions {
    /// 按内核能力生成配置
    pub fn for_kernel(version: KernelVersion, binary: bool) -> Self {
        Self {
            binary,
            input_length_unit: 0.001,
            input_coordinate_system: CoordinateSystem::Zup,
            transform_format: TransformFormat::Compact,
            parallel: version.supports_parallel_gltf(),
            metadata: BTreeMap::new(),
        }
    }
}

/// 几何内核
pub trait Kernel {
    fn name(&self) -> &str;

    fn version(&self) -> KernelVersion;

    /// 创建暂存文档
    fn open_document(&self) -> KernelResult<DocHandle>;

    /// 关闭暂存文档
    fn close_document(&self, doc: DocHandle);

    /// 读取 STEP/IGES 文件
    fn read_file(
        &self,
        doc: DocHandle,
        format: FileFormat,
        path: &Path,
        options: &ReaderOptions,
    ) -> KernelResult<TransferStatus>;

    /// 把已读取的内容转换到暂存文档
    fn transfer(&self, doc: DocHandle) -> KernelResult<()>;

    /// 暂存文档中的顶层标签
    fn labels(&self, doc: DocHandle) -> KernelResult<Vec<Label>>;

    /// 只读取几何，不带颜色/名称/装配结构
    fn read_shapes(&self, format: FileFormat, path: &Path) -> KernelResult<Vec<NamedShape>>;

    /// 把导出用的标签写入暂存文档
    fn add_labels(&self, doc: DocHandle, labels: Vec<Label>) -> KernelResult<()>;

    /// 更新装配（扁平导出后需要显式触发）
    fn update_assemblies(&self, doc: DocHandle) -> KernelResult<()>;

    fn write_step(
        &self,
        doc: DocHandle,
        path: &Path,
        options: &StepWriteOptions,
    ) -> KernelResult<TransferStatus>;

    fn write_iges(&self, doc: DocHandle, path: &Path, header: &IgesHeader) -> KernelResult<bool>;

    fn write_gltf(&self, doc: DocHandle, path: &Path, options: &GltfOptions) -> KernelResult<bool>;

    /// 对象集合能否走扁平（旧版）导出路径
    ///
    /// 默认要求每个对象都是零件特征或容器，链接和注释只能由层次化导出处理。
    fn can_fallback(&self, objects: &[&DocumentObject]) -> bool {
        objects.iter().all(|o| {
            !matches!(
                o.kind,
                ObjectKind::Link { .. } | ObjectKind::Annotation { .. }
            )
        })
    }
}

/// 作用域内的暂存文档，离开作用域时关闭
pub struct StagingDocument<'k, K: Kernel + ?Sized> {
    kernel: &'k K,
    handle: DocHandle,
}

impl<'k, K: Kernel + ?Sized> StagingDocument<'k, K> {
    pub fn open(kernel: &'k K) -> KernelResult<Self> {
        let handle = kernel.open_document()?;
        tracing::debug!("opened staging document {:?} in {}", handle, kernel.name());
        Ok(Self { kernel, handle })
    }

    pub fn handle(&self) -> DocHandle {
        self.handle
    }

    pub fn kernel(&self) -> &'k K {
        self.kernel
    }
}

impl<K: Kernel + ?Sized> Drop for StagingDocument<'_, K> {
    fn drop(&mut self) {
        self.kernel.close_document(self.handle);
        tracing::debug!("closed staging document {:?}", self.handle);
    }
}

/// 没有可用几何内核时的占位实现，只支持 DXF 之类不依赖内核的操作
#[derive(Debug, Default)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>() -> KernelResult<T> {
        Err(KernelError::Failure("no geometry kernel available".into()))
    }
}

impl Kernel for NullKernel {
    fn name(&self) -> &str {
        "none"
    }

    fn version(&self) -> KernelVersion {
        KernelVersion::new(0, 0, 0)
    }

    fn open_document(&self) -> KernelResult<DocHandle> {
        Self::unavailable()
    }

    fn close_document(&self, _doc: DocHandle) {}

    fn read_file(
        &self,
        _doc: DocHandle,
        _format: FileFormat,
        _path: &Path,
        _options: &ReaderOptions,
    ) -> KernelResult<TransferStatus> {
        Self::unavailable()
    }

    fn transfer(&self, _doc: DocHandle) -> KernelResult<()> {
        Self::unavailable()
    }

    fn labels(&self, _doc: DocHandle) -> KernelResult<Vec<Label>> {
        Self::unavailable()
    }

    fn read_shapes(&self, _format: FileFormat, _path: &Path) -> KernelResult<Vec<NamedShape>> {
        Self::unavailable()
    }

    fn add_labels(&self, _doc: DocHandle, _labels: Vec<Label>) -> KernelResult<()> {
        Self::unavailable()
    }

    fn update_assemblies(&self, _doc: DocHandle) -> KernelResult<()> {
        Self::unavailable()
    }

    fn write_step(
        &self,
        _doc: DocHandle,
        _path: &Path,
        _options: &StepWriteOptions,
    ) -> KernelResult<TransferStatus> {
        Self::unavailable()
    }

    fn write_iges(&self, _doc: DocHandle, _path: &Path, _header: &IgesHeader) -> KernelResult<bool> {
        Self::unavailable()
    }

    fn write_gltf(
        &self,
        _doc: DocHandle,
        _path: &Path,
        _options: &GltfOptions,
    ) -> KernelResult<bool> {
        Self::unavailable()
    }
}
