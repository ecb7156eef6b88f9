//! ZCAD 文档/对象模型
//!
//! 导入导出桥接层所依赖的宿主模型：
//! - `Application`: 文档注册表（创建/查找/活动文档、重算）
//! - `Document`: 文档内的对象集合、图层表
//! - `DocumentObject`: 零件特征、容器、链接等对象及其属性
//! - `Shape`: 由几何内核产生的形状，这里只保存边界曲线与拓扑类型
//!
//! # 示例
//!
//! ```rust
//! use zcad_core::prelude::*;
//!
//! let mut app = Application::new();
//! let doc = app.new_document(Some("Demo"));
//! let line = Shape::edge(Curve::line(Point3::origin(), Point3::new(10.0, 0.0, 0.0)));
//! let name = doc.add_object("Line", ObjectKind::Feature { shape: line }).name.clone();
//! assert_eq!(name, "Line");
//! ```

pub mod application;
pub mod document;
pub mod error;
pub mod id;
pub mod layer;
pub mod math;
pub mod object;
pub mod properties;
pub mod shape;

pub use application::Application;
pub use document::Document;
pub use error::DocumentError;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::application::Application;
    pub use crate::document::Document;
    pub use crate::id::ObjectId;
    pub use crate::layer::Layer;
    pub use crate::math::{Placement, Point3, Vector3};
    pub use crate::object::{DocumentObject, ObjectKind, ObjectRef};
    pub use crate::properties::{Appearance, Color};
    pub use crate::shape::{Curve, Shape, ShapeKind};
}
