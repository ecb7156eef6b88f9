//! 把暂存文档中的标签树装载为宿主文档对象

use crate::error::ImportError;
use crate::kernel::Label;
use crate::settings::ImportOptions;
use std::path::Path;
use zcad_core::document::Document;
use zcad_core::error::DocumentError;
use zcad_core::layer::Layer;
use zcad_core::math::Placement;
use zcad_core::object::{ObjectKind, ObjectRef};
use zcad_core::properties::{Appearance, Color};
use zcad_core::shape::Shape;
use zcad_core::Application;

/// 逐面颜色回调：对每个带显式面颜色的零件调用一次
pub type FaceColorSink<'a> = dyn FnMut(&ObjectRef, &[Color]) + 'a;

pub struct Loader<'a> {
    app: &'a mut Application,
    document: String,
    options: ImportOptions,
    /// 文件名（不含扩展名）
    file_name: String,
    /// 文件所在目录名
    directory: String,
}

impl<'a> Loader<'a> {
    pub fn new(
        app: &'a mut Application,
        document: impl Into<String>,
        path: &Path,
        options: ImportOptions,
    ) -> Self {
        let file_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unnamed")
            .to_string();
        let directory = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| file_name.clone());
        Self {
            app,
            document: document.into(),
            options,
            file_name,
            directory,
        }
    }

    /// 装载标签，返回在目标文档中创建的顶层对象
    pub fn load(
        &mut self,
        labels: &[Label],
        on_face_colors: &mut FaceColorSink<'_>,
    ) -> Result<Vec<ObjectRef>, ImportError> {
        let labels = if self.options.import_hidden {
            labels.to_vec()
        } else {
            strip_hidden(labels)
        };
        if labels.is_empty() {
            tracing::debug!("nothing to load from {}", self.file_name);
            return Ok(Vec::new());
        }

        if self.options.merge {
            return self.load_merged(&labels).map(|r| vec![r]);
        }
        if self.options.mode.splits_documents() {
            return self.load_split(&labels, on_face_colors);
        }

        let use_link_group = self.options.use_link_group;
        let group_name = self.base_name().to_string();
        let grouped = self.options.mode.is_grouped();
        let doc = self.target()?;
        let doc_name = doc.name().to_string();

        let group = if grouped {
            let name = doc
                .add_object(&group_name, ObjectKind::Group { children: Vec::new() })
                .name
                .clone();
            Some(name)
        } else {
            None
        };

        let mut roots = Vec::new();
        for label in &labels {
            let name = create_label(doc, label, group.as_deref(), use_link_group, on_face_colors)?;
            if group.is_none() {
                roots.push(ObjectRef::new(doc_name.as_str(), name));
            }
        }
        if let Some(group) = group {
            roots.push(ObjectRef::new(doc_name, group));
        }
        Ok(roots)
    }

    /// 所有零件合并为一个复合形状
    fn load_merged(&mut self, labels: &[Label]) -> Result<ObjectRef, ImportError> {
        let mut shapes = Vec::new();
        collect_shapes(labels, &Placement::identity(), &mut shapes);
        let file_name = self.file_name.clone();
        let doc = self.target()?;
        let name = doc
            .add_object(
                &file_name,
                ObjectKind::Feature {
                    shape: Shape::compound(shapes),
                },
            )
            .name
            .clone();
        tracing::debug!("merged {} into '{}'", file_name, name);
        Ok(ObjectRef::new(doc.name(), name))
    }

    /// 每个顶层装配放入单独的新文档，目标文档中创建指向它的链接
    fn load_split(
        &mut self,
        labels: &[Label],
        on_face_colors: &mut FaceColorSink<'_>,
    ) -> Result<Vec<ObjectRef>, ImportError> {
        let use_link_group = self.options.use_link_group;
        let base = self.base_name().to_string();
        let mut roots = Vec::new();

        for label in labels {
            if !label.is_assembly() {
                let doc = self.target()?;
                let name = create_label(doc, label, None, use_link_group, on_face_colors)?;
                roots.push(ObjectRef::new(doc.name(), name));
                continue;
            }

            let doc = self
                .app
                .new_document(Some(&format!("{}_{}", base, label.name)));
            let sub_doc = doc.name().to_string();
            let root = create_label(doc, label, None, use_link_group, on_face_colors)?;
            self.app.recompute(&sub_doc)?;

            let target = self.target()?;
            let link = target
                .add_object(
                    &label.name,
                    ObjectKind::Link {
                        document: sub_doc.clone(),
                        object: root,
                    },
                )
                .name
                .clone();
            tracing::debug!("linked {} from document '{}'", link, sub_doc);
            roots.push(ObjectRef::new(target.name(), link));
        }

        self.app.set_active_document(&self.document)?;
        Ok(roots)
    }

    fn base_name(&self) -> &str {
        if self.options.mode.uses_directory_name() {
            &self.directory
        } else {
            &self.file_name
        }
    }

    fn target(&mut self) -> Result<&mut Document, DocumentError> {
        let name = &self.document;
        self.app
            .get_document_mut(name)
            .ok_or_else(|| DocumentError::DocumentNotFound(name.clone()))
    }
}

fn strip_hidden(labels: &[Label]) -> Vec<Label> {
    labels
        .iter()
        .filter(|l| l.visible)
        .map(|l| {
            let mut label = l.clone();
            label.children = strip_hidden(&l.children);
            label
        })
        .collect()
}

fn collect_shapes(labels: &[Label], parent: &Placement, out: &mut Vec<Shape>) {
    for label in labels {
        let placement = parent * label.placement;
        if let Some(shape) = &label.shape {
            out.push(shape.transformed(&placement));
        }
        collect_shapes(&label.children, &placement, out);
    }
}

/// 递归创建对象，返回内部名称
fn create_label(
    doc: &mut Document,
    label: &Label,
    parent: Option<&str>,
    use_link_group: bool,
    on_face_colors: &mut FaceColorSink<'_>,
) -> Result<String, DocumentError> {
    let appearance = Appearance {
        shape_color: label.color,
        diffuse_colors: label.face_colors.clone(),
        visible: label.visible,
    };

    let name = match &label.shape {
        None => {
            let kind = if use_link_group {
                ObjectKind::LinkGroup { children: Vec::new() }
            } else {
                ObjectKind::Part { children: Vec::new() }
            };
            let object = doc.add_object(&label.name, kind);
            object.placement = label.placement;
            object.appearance = appearance;
            let name = object.name.clone();
            for child in &label.children {
                create_label(doc, child, Some(&name), use_link_group, on_face_colors)?;
            }
            name
        }
        Some(shape) => {
            let object = doc.add_object(
                &label.name,
                ObjectKind::Feature {
                    shape: shape.clone(),
                },
            );
            object.placement = label.placement;
            object.appearance = appearance;
            let name = object.name.clone();
            if !label.face_colors.is_empty() {
                on_face_colors(&ObjectRef::new(doc.name(), name.as_str()), &label.face_colors);
            }
            name
        }
    };

    if let Some(layer) = &label.layer {
        if doc.layers.get_layer(layer).is_none() {
            doc.layers.add_layer(Layer::new(layer.as_str()));
        }
    }
    if let Some(parent) = parent {
        doc.add_child(parent, &name)?;
    }
    tracing::debug!("loaded '{}' as {}", label.name, name);
    Ok(name)
}
