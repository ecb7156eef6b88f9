//! ZCAD 导入导出桥接
//!
//! 把 STEP/IGES/glTF/DXF 的导入导出暴露给脚本层：
//! - `args`/`value`: 参数适配，把动态参数校验为强类型请求
//! - `format`: 按扩展名分派格式
//! - `kernel`: 几何内核接口与作用域内的暂存文档
//! - `import`/`loader`: STEP/IGES 导入流程（含无颜色降级重试）
//! - `export`/`exporter`: 导出流程与扁平/层次化导出选择
//! - `dxf_io`: 不依赖几何内核的 DXF 读写
//! - `error`: 内部错误及其到脚本层异常的翻译
//! - `module`: 脚本层的方法表与入口
//!
//! # 示例
//!
//! ```rust,no_run
//! use zcad_import::kernel::NullKernel;
//! use zcad_import::module::ImportModule;
//! use zcad_import::value::Args;
//!
//! let mut module = ImportModule::new(NullKernel);
//! module.call("readDXF", &Args::new().arg("drawing.dxf").arg("Drawing")).unwrap();
//! ```

pub mod args;
pub mod dxf_io;
pub mod error;
pub mod export;
pub mod exporter;
pub mod format;
pub mod import;
pub mod kernel;
pub mod loader;
pub mod module;
pub mod params;
pub mod settings;
pub mod value;

#[cfg(test)]
mod testing;

pub use error::{ImportError, ScriptError};
pub use format::FileFormat;
pub use kernel::{Kernel, NullKernel};
pub use module::ImportModule;
pub use params::ParameterManager;
pub use value::{Args, Value};

/// 写入文件头的应用名
pub const APP_NAME: &str = "ZCAD";
