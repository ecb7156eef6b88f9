//! STEP/IGES 导入
//!
//! 流程：
//! 1. 按扩展名判定格式，不支持的格式直接报错，不创建任何文档
//! 2. 选择目标文档（`docName` 指定且存在时使用它，否则新建）
//! 3. 打开暂存文档，以保留颜色/名称/图层的方式读取并转换
//! 4. 内核报告结构性失败时记录日志，改为只读取几何并直接挂到目标文档
//! 5. 否则把暂存标签装载为宿主对象，收集带逐面颜色的零件
//!
//! 暂存文档在任何情况下都会关闭。

use crate::args::ImportRequest;
use crate::error::{ImportError, KernelError};
use crate::format::FileFormat;
use crate::kernel::{Kernel, ReaderOptions, StagingDocument, TransferStatus};
use crate::loader::Loader;
use crate::params::ParameterManager;
use crate::settings::{IgesSettings, ImportOptions};
use std::path::Path;
use zcad_core::object::{ObjectKind, ObjectRef};
use zcad_core::properties::Color;
use zcad_core::Application;

/// 带逐面颜色的零件
#[derive(Debug, Clone, PartialEq)]
pub struct PartColors {
    pub object: ObjectRef,
    pub colors: Vec<Color>,
}

/// 导入结果
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// 目标文档名
    pub document: String,
    /// 创建的顶层对象
    pub objects: Vec<ObjectRef>,
    pub part_colors: Vec<PartColors>,
    /// 是否经过无颜色降级读取
    pub used_fallback: bool,
}

/// 导入 STEP/IGES 文件
pub fn import_file<K: Kernel + ?Sized>(
    app: &mut Application,
    kernel: &K,
    params: &ParameterManager,
    request: &ImportRequest,
) -> Result<ImportOutcome, ImportError> {
    let path = request.path.as_path();
    let format = FileFormat::from_path(path);
    if !format.can_import() {
        return Err(ImportError::Io("no supported file format".into()));
    }
    tracing::info!("importing {} file {}", format, path.display());

    let document = match request
        .document
        .as_deref()
        .and_then(|name| app.get_document(name))
    {
        Some(doc) => doc.name().to_string(),
        None => app.new_document(None).name().to_string(),
    };

    let staging = StagingDocument::open(kernel)?;
    let mut reader = ReaderOptions::full();
    if format == FileFormat::Iges {
        reader.read_visible_only = Some(IgesSettings::from_params(params).skip_blank_entities);
    }

    match read_into_staging(&staging, format, path, &reader) {
        Ok(()) => {}
        Err(ImportError::Kernel(KernelError::Structural(message))) => {
            tracing::error!("{}", message);
            tracing::info!("retrying {} without colors", path.display());
            let objects = import_bare(app, kernel, &document, format, path)?;
            return Ok(ImportOutcome {
                document,
                objects,
                part_colors: Vec::new(),
                used_fallback: true,
            });
        }
        Err(e) => return Err(e),
    }

    let mut options = ImportOptions::from_params(params);
    if let Some(merge) = request.merge {
        options.merge = merge;
    }
    if let Some(hidden) = request.import_hidden {
        options.import_hidden = hidden;
    }
    if let Some(link_group) = request.use_link_group {
        options.use_link_group = link_group;
    }
    if let Some(mode) = request.mode {
        options.set_mode(mode);
    }

    let labels = kernel.labels(staging.handle())?;
    let mut part_colors = Vec::new();
    let objects = {
        let mut collect = |object: &ObjectRef, colors: &[Color]| {
            part_colors.push(PartColors {
                object: object.clone(),
                colors: colors.to_vec(),
            })
        };
        Loader::new(app, document.as_str(), path, options).load(&labels, &mut collect)?
    };
    app.recompute(&document)?;

    tracing::info!(
        "imported {} object(s) into '{}', {} with face colors",
        objects.len(),
        document,
        part_colors.len()
    );
    Ok(ImportOutcome {
        document,
        objects,
        part_colors,
        used_fallback: false,
    })
}

fn read_into_staging<K: Kernel + ?Sized>(
    staging: &StagingDocument<'_, K>,
    format: FileFormat,
    path: &Path,
    reader: &ReaderOptions,
) -> Result<(), ImportError> {
    let kernel = staging.kernel();
    let status = kernel.read_file(staging.handle(), format, path, reader)?;
    if status != TransferStatus::Done {
        return Err(ImportError::Io(format!(
            "cannot read {} file",
            format.name()
        )));
    }
    kernel.transfer(staging.handle())?;
    Ok(())
}

/// 只读取几何，每个形状成为一个零件特征
fn import_bare<K: Kernel + ?Sized>(
    app: &mut Application,
    kernel: &K,
    document: &str,
    format: FileFormat,
    path: &Path,
) -> Result<Vec<ObjectRef>, ImportError> {
    let shapes = kernel.read_shapes(format, path)?;
    let doc = app
        .get_document_mut(document)
        .ok_or_else(|| zcad_core::DocumentError::DocumentNotFound(document.to_string()))?;
    let objects = shapes
        .into_iter()
        .map(|named| {
            let name = doc
                .add_object(&named.name, ObjectKind::Feature { shape: named.shape })
                .name
                .clone();
            ObjectRef::new(document, name)
        })
        .collect();
    app.recompute(document)?;
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Label;
    use crate::testing::{MockFile, MockKernel};
    use crate::settings::IGES_GROUP;
    use zcad_core::shape::Shape;

    fn colored_labels() -> Vec<Label> {
        vec![Label::assembly(
            "Asm",
            vec![
                Label::part("Bolt", Shape::cuboid(1.0, 1.0, 5.0))
                    .with_face_colors(vec![Color::RED; 6]),
                Label::part("Plate", Shape::cuboid(10.0, 10.0, 1.0)),
            ],
        )]
    }

    #[test]
    fn test_import_returns_part_colors() {
        let kernel = MockKernel::new();
        kernel.register_labels("asm.step", colored_labels());
        let mut app = Application::new();
        let params = ParameterManager::new();

        let outcome =
            import_file(&mut app, &kernel, &params, &ImportRequest::new("asm.step")).unwrap();
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.part_colors.len(), 1);
        assert_eq!(outcome.part_colors[0].object.object, "Bolt");
        assert_eq!(outcome.part_colors[0].colors.len(), 6);
        assert_eq!(app.get_document(&outcome.document).unwrap().object_count(), 3);
        assert_eq!(kernel.open_handles(), 0);
        assert_eq!(kernel.reader_options()[0], ReaderOptions::full());
    }

    #[test]
    fn test_corrupt_colors_fall_back_to_bare_geometry() {
        let kernel = MockKernel::new();
        kernel.register(
            "broken.stp",
            MockFile {
                labels: colored_labels(),
                corrupt_colors: true,
                unreadable: false,
            },
        );
        let mut app = Application::new();
        let outcome = import_file(
            &mut app,
            &kernel,
            &ParameterManager::new(),
            &ImportRequest::new("broken.stp"),
        )
        .unwrap();

        assert!(outcome.used_fallback);
        assert!(outcome.part_colors.is_empty());
        let doc = app.get_document(&outcome.document).unwrap();
        assert_eq!(doc.object_count(), 2);
        assert!(doc.objects().all(|o| o.is_part_feature()));
        assert_eq!(doc.recompute_count(), 1);
        assert_eq!(kernel.open_handles(), 0);
    }

    #[test]
    fn test_unreadable_and_unsupported_files() {
        let kernel = MockKernel::new();
        let mut app = Application::new();
        let params = ParameterManager::new();

        let err = import_file(&mut app, &kernel, &params, &ImportRequest::new("missing.iges"))
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot read IGES file");
        assert_eq!(kernel.open_handles(), 0);

        let before = app.document_count();
        let err = import_file(&mut app, &kernel, &params, &ImportRequest::new("model.obj"))
            .unwrap_err();
        assert_eq!(err.to_string(), "no supported file format");
        assert_eq!(app.document_count(), before);
    }

    #[test]
    fn test_insert_into_named_document() {
        let kernel = MockKernel::new();
        kernel.register_labels("a.step", colored_labels());
        let mut app = Application::new();
        app.new_document(Some("Existing"));
        app.new_document(Some("Other"));

        let mut request = ImportRequest::new("a.step");
        request.document = Some("Existing".into());
        request.merge = Some(true);
        let outcome = import_file(&mut app, &kernel, &ParameterManager::new(), &request).unwrap();
        assert_eq!(outcome.document, "Existing");
        assert_eq!(outcome.objects, vec![ObjectRef::new("Existing", "a")]);
        assert_eq!(app.document_count(), 2);
    }

    #[test]
    fn test_iges_honours_skip_blank_entities() {
        let kernel = MockKernel::new();
        kernel.register_labels(
            "a.igs",
            vec![
                Label::part("Shown", Shape::cuboid(1.0, 1.0, 1.0)),
                Label::part("Blank", Shape::cuboid(1.0, 1.0, 1.0)).hidden(),
            ],
        );
        let mut params = ParameterManager::new();
        let mut app = Application::new();

        let outcome = import_file(&mut app, &kernel, &params, &ImportRequest::new("a.igs")).unwrap();
        assert_eq!(outcome.objects.len(), 1);
        assert_eq!(kernel.reader_options()[0].read_visible_only, Some(true));

        params
            .user_group_mut(IGES_GROUP)
            .set_bool("SkipBlankEntities", false);
        let outcome = import_file(&mut app, &kernel, &params, &ImportRequest::new("a.igs")).unwrap();
        assert_eq!(outcome.objects.len(), 2);
    }
}
