//! 文档操作错误定义

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Document '{0}' not found")]
    DocumentNotFound(String),

    #[error("Object '{object}' not found in document '{document}'")]
    ObjectNotFound { document: String, object: String },

    #[error("Object '{0}' is not a container")]
    NotAContainer(String),

    #[error("Object '{child}' cannot be added to '{parent}': it already has a parent")]
    AlreadyParented { parent: String, child: String },

    #[error("Link '{link}' points to missing object '{target}'")]
    BrokenLink { link: String, target: String },

    #[error("Group '{group}' references missing object {child}")]
    DanglingChild { group: String, child: u64 },
}
