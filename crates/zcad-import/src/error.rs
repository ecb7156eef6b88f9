//! 导入导出错误定义
//!
//! 内部错误（内核、宿主文档、偏好设置、DXF）统一汇总为 [`ImportError`]，
//! 在脚本入口处再翻译为脚本层可见的 [`ScriptError`]。

use thiserror::Error;
use zcad_core::DocumentError;

/// 几何内核报告的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// 结构性/操作系统级失败（例如颜色表损坏导致的访问异常），导入时可降级重试
    #[error("{0}")]
    Structural(String),

    /// 其他内核失败
    #[error("{0}")]
    Failure(String),
}

/// 偏好设置存储错误
#[derive(Error, Debug)]
pub enum ParamError {
    #[error("Invalid parameter path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// DXF 读写错误
#[derive(Error, Debug)]
pub enum DxfError {
    #[error("File doesn't exist")]
    FileNotFound,

    #[error("DXF parse error: {0}")]
    Parse(String),

    #[error("Malformed {kind} entity: {reason}")]
    Malformed { kind: String, reason: &'static str },

    #[error("DXF write error: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 导入导出流程中的错误
#[derive(Error, Debug)]
pub enum ImportError {
    /// 文件格式不支持或文件读写失败，消息原样交给调用方
    #[error("{0}")]
    Io(String),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("{0}")]
    FeatureUnavailable(String),

    #[error(transparent)]
    Dxf(#[from] DxfError),

    #[error(transparent)]
    Param(#[from] ParamError),
}

impl ImportError {
    /// DXF 入口把所有失败都作为运行时错误抛出
    pub fn into_runtime(self) -> ScriptError {
        ScriptError::Runtime(self.to_string())
    }
}

/// 脚本层可见的异常
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("TypeError: {0}")]
    Type(String),

    #[error("ValueError: {0}")]
    Value(String),

    #[error("IOError: {0}")]
    Io(String),

    #[error("RuntimeError: {0}")]
    Runtime(String),

    /// 应用程序通用错误，携带内核原始消息
    #[error("GeneralError: {0}")]
    General(String),

    /// 宿主框架错误，保留原始表示
    #[error("{0}")]
    Host(String),
}

impl ScriptError {
    /// 异常类型名
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptError::Type(_) => "TypeError",
            ScriptError::Value(_) => "ValueError",
            ScriptError::Io(_) => "IOError",
            ScriptError::Runtime(_) => "RuntimeError",
            ScriptError::General(_) => "GeneralError",
            ScriptError::Host(_) => "HostError",
        }
    }

    /// 不带类型前缀的消息
    pub fn message(&self) -> &str {
        match self {
            ScriptError::Type(m)
            | ScriptError::Value(m)
            | ScriptError::Io(m)
            | ScriptError::Runtime(m)
            | ScriptError::General(m)
            | ScriptError::Host(m) => m,
        }
    }
}

impl From<ImportError> for ScriptError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Io(msg) => ScriptError::Io(msg),
            ImportError::Kernel(e) => ScriptError::General(e.to_string()),
            ImportError::Document(e) => ScriptError::Host(e.to_string()),
            ImportError::Param(e) => ScriptError::Host(e.to_string()),
            ImportError::FeatureUnavailable(msg) => ScriptError::Runtime(msg),
            ImportError::Dxf(e) => ScriptError::Runtime(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_keeps_messages() {
        let io: ScriptError = ImportError::Io("no supported file format".into()).into();
        assert_eq!(io, ScriptError::Io("no supported file format".into()));
        assert_eq!(io.to_string(), "IOError: no supported file format");

        let kernel: ScriptError =
            ImportError::Kernel(KernelError::Failure("Standard_Failure".into())).into();
        assert_eq!(kernel.kind(), "GeneralError");
        assert_eq!(kernel.message(), "Standard_Failure");

        let host: ScriptError =
            ImportError::Document(DocumentError::DocumentNotFound("Asm".into())).into();
        assert_eq!(host.to_string(), "Document 'Asm' not found");
    }

    #[test]
    fn test_dxf_paths_become_runtime_errors() {
        let err = ImportError::Dxf(DxfError::FileNotFound).into_runtime();
        assert_eq!(err, ScriptError::Runtime("File doesn't exist".into()));

        let err = ImportError::Kernel(KernelError::Failure("bad shape".into())).into_runtime();
        assert_eq!(err.kind(), "RuntimeError");
        assert_eq!(err.message(), "bad shape");
    }
}
