//! STEP/IGES/glTF 导出

use crate::args::ExportRequest;
use crate::error::ImportError;
use crate::exporter::{build_labels, build_legacy_labels};
use crate::format::FileFormat;
use crate::kernel::{GltfOptions, Kernel, StagingDocument, StepWriteOptions};
use crate::params::ParameterManager;
use crate::settings::{ExportOptions, IgesSettings, StepHeader};
use zcad_core::object::DocumentObject;
use zcad_core::Application;

/// 导出路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStrategy {
    /// 扁平（旧版）导出
    Legacy,
    /// 层次化导出
    Full,
}

/// 导出结果
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub strategy: ExportStrategy,
    pub format: FileFormat,
    /// 交给内核的对象数
    pub objects: usize,
    /// 是否写出了文件
    pub written: bool,
}

/// 选择导出路径：请求扁平导出且内核认可该对象集合时才走扁平路径
pub fn choose_strategy<K: Kernel + ?Sized>(
    kernel: &K,
    objects: &[&DocumentObject],
    legacy: bool,
) -> ExportStrategy {
    if legacy && kernel.can_fallback(objects) {
        ExportStrategy::Legacy
    } else {
        ExportStrategy::Full
    }
}

/// 导出对象到文件
///
/// 无法解析的对象引用被静默忽略；扩展名不是 STEP/IGES/glTF 时不产生输出也不报错。
pub fn export_file<K: Kernel + ?Sized>(
    app: &Application,
    kernel: &K,
    params: &ParameterManager,
    request: &ExportRequest,
) -> Result<ExportReport, ImportError> {
    let path = request.path.as_path();
    let format = FileFormat::from_path(path);
    let refs: Vec<_> = request
        .objects
        .iter()
        .filter(|r| app.resolve(r).is_some())
        .cloned()
        .collect();
    let objects: Vec<&DocumentObject> = refs.iter().filter_map(|r| app.resolve(r)).collect();
    tracing::info!(
        "exporting {} object(s) to {} ({})",
        objects.len(),
        path.display(),
        format
    );

    let staging = StagingDocument::open(kernel)?;
    let mut options = ExportOptions::from_params(params);
    let legacy = request.legacy.unwrap_or(options.legacy);
    let strategy = choose_strategy(kernel, &objects, legacy);

    match strategy {
        ExportStrategy::Full => {
            if let Some(hidden) = request.export_hidden {
                options.export_hidden = hidden;
            }
            if let Some(keep) = request.keep_placement {
                options.keep_placement = keep;
            }
            kernel.add_labels(staging.handle(), build_labels(app, &refs, &options))?;
        }
        ExportStrategy::Legacy => {
            kernel.add_labels(staging.handle(), build_legacy_labels(app, &refs))?;
            kernel.update_assemblies(staging.handle())?;
        }
    }
    tracing::debug!("export strategy {:?}", strategy);

    let written = match format {
        FileFormat::Step => {
            let options = StepWriteOptions {
                assembly_mode: true,
                header: StepHeader::from_params(params),
            };
            let status = kernel.write_step(staging.handle(), path, &options)?;
            if status.is_failure() {
                return Err(ImportError::Io(format!(
                    "Cannot open file '{}'",
                    path.display()
                )));
            }
            true
        }
        FileFormat::Iges => {
            let header = IgesSettings::from_params(params).header;
            if !kernel.write_iges(staging.handle(), path, &header)? {
                return Err(ImportError::Io(format!(
                    "Cannot open file '{}'",
                    path.display()
                )));
            }
            true
        }
        FileFormat::Gltf { binary } => {
            let version = kernel.version();
            if !version.supports_gltf() {
                return Err(ImportError::FeatureUnavailable(format!(
                    "glTF support requires geometry kernel 7.5.0 or later (found {})",
                    version
                )));
            }
            let options = GltfOptions::for_kernel(version, binary);
            if !kernel.write_gltf(staging.handle(), path, &options)? {
                return Err(ImportError::Io(format!(
                    "Cannot save to file '{}'",
                    path.display()
                )));
            }
            true
        }
        FileFormat::Dxf | FileFormat::Unsupported => {
            tracing::debug!("no {} writer, nothing written", format);
            false
        }
    };

    Ok(ExportReport {
        strategy,
        format,
        objects: objects.len(),
        written,
    })
}
