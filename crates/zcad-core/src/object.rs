//! 文档对象
//!
//! 对象按类型分为零件特征（携带形状）、容器（Part/Group/LinkGroup）、
//! 跨文档链接以及不带几何的注释对象。

use crate::id::ObjectId;
use crate::math::Placement;
use crate::properties::Appearance;
use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 对象类型与类型特有数据
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// 零件特征，持有形状
    Feature { shape: Shape },
    /// 装配容器，子对象的放置相对于容器
    Part { children: Vec<ObjectId> },
    /// 普通分组，不带放置语义
    Group { children: Vec<ObjectId> },
    /// 链接分组
    LinkGroup { children: Vec<ObjectId> },
    /// 指向（可能位于其他文档的）对象的链接
    Link { document: String, object: String },
    /// 不带几何的注释
    Annotation { text: Vec<String> },
}

impl ObjectKind {
    /// 脚本层可见的类型名
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Feature { .. } => "Part::Feature",
            ObjectKind::Part { .. } => "App::Part",
            ObjectKind::Group { .. } => "App::DocumentObjectGroup",
            ObjectKind::LinkGroup { .. } => "App::LinkGroup",
            ObjectKind::Link { .. } => "App::Link",
            ObjectKind::Annotation { .. } => "App::Annotation",
        }
    }
}

/// 文档中的对象
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentObject {
    pub id: ObjectId,
    /// 文档内唯一的内部名称
    pub name: String,
    /// 用户可见标签
    pub label: String,
    pub kind: ObjectKind,
    pub placement: Placement,
    pub appearance: Appearance,
}

impl DocumentObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        let name = name.into();
        Self {
            id: ObjectId::new(),
            label: name.clone(),
            name,
            kind,
            placement: Placement::identity(),
            appearance: Appearance::default(),
        }
    }

    pub fn is_part_feature(&self) -> bool {
        matches!(self.kind, ObjectKind::Feature { .. })
    }

    pub fn shape(&self) -> Option<&Shape> {
        match &self.kind {
            ObjectKind::Feature { shape } => Some(shape),
            _ => None,
        }
    }

    pub fn children(&self) -> &[ObjectId] {
        match &self.kind {
            ObjectKind::Part { children }
            | ObjectKind::Group { children }
            | ObjectKind::LinkGroup { children } => children,
            _ => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<ObjectId>> {
        match &mut self.kind {
            ObjectKind::Part { children }
            | ObjectKind::Group { children }
            | ObjectKind::LinkGroup { children } => Some(children),
            _ => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.appearance.visible
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

/// 脚本层持有的对象引用（文档名 + 对象内部名）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub document: String,
    pub object: String,
}

impl ObjectRef {
    pub fn new(document: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.object)
    }
}
