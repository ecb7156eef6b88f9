//! 把宿主文档对象转换为导出用的标签树
//!
//! 两种转换方式：
//! - 层次化导出：保留容器和链接结构，按选项处理隐藏对象和顶层放置
//! - 扁平（旧版）导出：不解析链接，只保留整体颜色，顶层形状使用绝对放置

use crate::kernel::{Label, PlacementMode};
use crate::settings::ExportOptions;
use zcad_core::document::Document;
use zcad_core::math::Placement;
use zcad_core::object::{DocumentObject, ObjectKind, ObjectRef};
use zcad_core::Application;

/// 链接展开的最大深度
const MAX_DEPTH: usize = 32;

/// 层次化导出
pub fn build_labels(app: &Application, objects: &[ObjectRef], options: &ExportOptions) -> Vec<Label> {
    objects
        .iter()
        .filter_map(|r| {
            let doc = app.get_document(&r.document)?;
            let object = doc.object(&r.object)?;
            to_label(app, doc, object, options, true, 0)
        })
        .collect()
}

fn to_label(
    app: &Application,
    doc: &Document,
    object: &DocumentObject,
    options: &ExportOptions,
    top_level: bool,
    depth: usize,
) -> Option<Label> {
    if depth > MAX_DEPTH {
        tracing::warn!("link depth exceeded at '{}'", object.name);
        return None;
    }
    if !object.is_visible() && !options.export_hidden {
        tracing::debug!("skipping hidden object '{}'", object.name);
        return None;
    }

    let mut label = match &object.kind {
        ObjectKind::Feature { shape } => {
            let mut label = Label::part(object.label.as_str(), shape.clone())
                .with_face_colors(object.appearance.diffuse_colors.clone());
            label.color = object.appearance.shape_color;
            label
        }
        ObjectKind::Part { children }
        | ObjectKind::Group { children }
        | ObjectKind::LinkGroup { children } => {
            let children = children
                .iter()
                .filter_map(|id| doc.object_by_id(*id))
                .filter_map(|child| to_label(app, doc, child, options, false, depth + 1))
                .collect();
            Label::assembly(object.label.as_str(), children)
        }
        ObjectKind::Link { document, object: target } => {
            let target_doc = app.get_document(document)?;
            let target = target_doc.object(target)?;
            let mut label = to_label(app, target_doc, target, options, false, depth + 1)?;
            label.name = object.label.clone();
            label
        }
        ObjectKind::Annotation { .. } => return None,
    };

    label.visible = object.is_visible();
    label.placement = if top_level && !options.keep_placement {
        Placement::identity()
    } else {
        object.placement
    };
    Some(label)
}

/// 扁平（旧版）导出
///
/// 只有自由对象（不在其他请求对象之内）生成顶层标签，使用全局的绝对放置；
/// 嵌套在容器中的标签使用相对父级的显式放置。
pub fn build_legacy_labels(app: &Application, objects: &[ObjectRef]) -> Vec<Label> {
    let resolved: Vec<(&Document, &DocumentObject)> = objects
        .iter()
        .filter_map(|r| {
            let doc = app.get_document(&r.document)?;
            Some((doc, doc.object(&r.object)?))
        })
        .collect();

    let mut labels = Vec::new();
    let mut seen = Vec::new();
    for &(doc, object) in &resolved {
        let nested = ancestors(doc, object).any(|parent| {
            resolved
                .iter()
                .any(|&(d, o)| d.name() == doc.name() && o.id == parent.id)
        });
        if nested {
            tracing::debug!("'{}' is exported inside its container", object.name);
            continue;
        }
        let key = (doc.name(), object.id);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        if let Some(mut label) = to_legacy_label(doc, object) {
            label.placement = global_placement(doc, object);
            label.placement_mode = PlacementMode::Absolute;
            labels.push(label);
        }
    }
    tracing::debug!("legacy export: {} free label(s)", labels.len());
    labels
}

/// 由近及远的容器链
fn ancestors<'a>(
    doc: &'a Document,
    object: &DocumentObject,
) -> impl Iterator<Item = &'a DocumentObject> {
    let mut current = doc.parent_of(object.id);
    let mut depth = 0;
    std::iter::from_fn(move || {
        let parent = current.filter(|_| depth < MAX_DEPTH)?;
        depth += 1;
        current = doc.parent_of(parent.id);
        Some(parent)
    })
}

/// 对象在文档中的全局放置
fn global_placement(doc: &Document, object: &DocumentObject) -> Placement {
    ancestors(doc, object).fold(object.placement, |acc, parent| parent.placement * acc)
}

fn to_legacy_label(doc: &Document, object: &DocumentObject) -> Option<Label> {
    let mut label = match &object.kind {
        ObjectKind::Feature { shape } => Label::part(object.label.as_str(), shape.clone()),
        ObjectKind::Part { children }
        | ObjectKind::Group { children }
        | ObjectKind::LinkGroup { children } => {
            let children = children
                .iter()
                .filter_map(|id| doc.object_by_id(*id))
                .filter_map(|child| to_legacy_label(doc, child))
                .collect();
            Label::assembly(object.label.as_str(), children)
        }
        ObjectKind::Link { .. } | ObjectKind::Annotation { .. } => return None,
    };
    label.color = object.appearance.shape_color;
    label.placement = object.placement;
    label.placement_mode = PlacementMode::Explicit;
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zcad_core::math::translation;
    use zcad_core::properties::Color;
    use zcad_core::shape::Shape;

    fn setup() -> Application {
        let mut app = Application::new();
        let doc = app.new_document(Some("Doc"));
        doc.add_object("Asm", ObjectKind::Part { children: vec![] })
            .placement = translation(5.0, 0.0, 0.0);
        let bolt = doc.add_object(
            "Bolt",
            ObjectKind::Feature {
                shape: Shape::cuboid(1.0, 1.0, 4.0),
            },
        );
        bolt.placement = translation(0.0, 1.0, 0.0);
        bolt.appearance.shape_color = Some(Color::RED);
        bolt.appearance.diffuse_colors = vec![Color::GREEN; 6];
        let hidden = doc.add_object(
            "Hidden",
            ObjectKind::Feature {
                shape: Shape::cuboid(1.0, 1.0, 1.0),
            },
        );
        hidden.appearance.visible = false;
        doc.add_child("Asm", "Bolt").unwrap();
        doc.add_child("Asm", "Hidden").unwrap();
        doc.add_object(
            "BoltLink",
            ObjectKind::Link {
                document: "Doc".into(),
                object: "Bolt".into(),
            },
        );
        doc.add_object("Note", ObjectKind::Annotation { text: vec!["x".into()] });
        app
    }

    fn refs(names: &[&str]) -> Vec<ObjectRef> {
        names.iter().map(|n| ObjectRef::new("Doc", *n)).collect()
    }

    #[test]
    fn test_full_export_options() {
        let app = setup();
        let options = ExportOptions {
            export_hidden: false,
            keep_placement: false,
            legacy: false,
        };
        let labels = build_labels(&app, &refs(&["Asm", "Missing", "Note"]), &options);
        assert_eq!(labels.len(), 1);
        let asm = &labels[0];
        assert_eq!(asm.placement, Placement::identity());
        assert_eq!(asm.children.len(), 1);
        assert_eq!(asm.children[0].placement, translation(0.0, 1.0, 0.0));
        assert_eq!(asm.children[0].face_colors.len(), 6);

        let kept = build_labels(
            &app,
            &refs(&["Asm"]),
            &ExportOptions {
                keep_placement: true,
                ..options
            },
        );
        assert_eq!(kept[0].placement, translation(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_full_export_resolves_links() {
        let app = setup();
        let labels = build_labels(&app, &refs(&["BoltLink"]), &ExportOptions::default());
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "BoltLink");
        assert_eq!(labels[0].color, Some(Color::RED));
        assert!(labels[0].shape.is_some());
    }

    #[test]
    fn test_legacy_export_placements() {
        let app = setup();
        let labels = build_legacy_labels(&app, &refs(&["Asm", "BoltLink"]));
        assert_eq!(labels.len(), 1);
        let asm = &labels[0];
        assert_eq!(asm.placement_mode, PlacementMode::Absolute);
        assert_eq!(asm.placement, translation(5.0, 0.0, 0.0));
        assert_eq!(asm.children.len(), 2);
        assert!(asm
            .children
            .iter()
            .all(|c| c.placement_mode == PlacementMode::Explicit && c.face_colors.is_empty()));
        assert_eq!(asm.children[0].color, Some(Color::RED));
    }

    #[test]
    fn test_legacy_export_nested_object() {
        let app = setup();

        // 单独导出容器内的对象：使用全局放置
        let labels = build_legacy_labels(&app, &refs(&["Bolt"]));
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].placement_mode, PlacementMode::Absolute);
        assert_eq!(labels[0].placement, translation(5.0, 1.0, 0.0));

        // 容器和子对象同时请求：子对象只出现在容器内
        let labels = build_legacy_labels(&app, &refs(&["Asm", "Bolt", "Asm"]));
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Asm");
        assert_eq!(labels[0].placement, translation(5.0, 0.0, 0.0));
        let bolts = labels[0].children.iter().filter(|c| c.name == "Bolt").count();
        assert_eq!(bolts, 1);
        assert_eq!(labels[0].children[0].placement, translation(0.0, 1.0, 0.0));
        assert_eq!(labels[0].children[0].placement_mode, PlacementMode::Explicit);
    }
}
