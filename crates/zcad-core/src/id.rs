//! 对象标识
//!
//! 文档内的对象通过ID互相引用（容器的子对象列表等），名称只用于脚本层查找。

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// 全局对象ID生成器
static OBJECT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 对象唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// 创建新的对象ID
    pub fn new() -> Self {
        Self(OBJECT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// 从指定值创建
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// 空ID（无效）
    pub const NULL: ObjectId = ObjectId(0);

    /// 检查是否为空ID
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}
