//! 应用程序级文档注册表
//!
//! 负责文档的创建、查找、活动文档切换，以及带跨文档链接校验的重算。

use crate::document::{sanitize_name, Document};
use crate::error::DocumentError;
use crate::object::{DocumentObject, ObjectKind, ObjectRef};

/// 链接解析的最大深度
const MAX_LINK_DEPTH: usize = 16;

#[derive(Debug, Default)]
pub struct Application {
    documents: Vec<Document>,
    active: Option<usize>,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建新文档并设为活动文档
    ///
    /// 名称为空或已被占用时自动生成唯一名称。
    pub fn new_document(&mut self, name: Option<&str>) -> &mut Document {
        let base = sanitize_name(name.unwrap_or("Unnamed"));
        let mut name = base.clone();
        let mut suffix = 1;
        while self.get_document(&name).is_some() {
            name = format!("{}{}", base, suffix);
            suffix += 1;
        }
        tracing::debug!("created document '{}'", name);
        self.documents.push(Document::new(name));
        let idx = self.documents.len() - 1;
        self.active = Some(idx);
        &mut self.documents[idx]
    }

    pub fn get_document(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.name() == name)
    }

    pub fn get_document_mut(&mut self, name: &str) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.name() == name)
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.active.map(|i| &self.documents[i])
    }

    pub fn active_document_name(&self) -> Option<&str> {
        self.active_document().map(Document::name)
    }

    /// 设置活动文档
    pub fn set_active_document(&mut self, name: &str) -> Result<(), DocumentError> {
        let idx = self
            .documents
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| DocumentError::DocumentNotFound(name.to_string()))?;
        self.active = Some(idx);
        Ok(())
    }

    /// 关闭文档
    pub fn close_document(&mut self, name: &str) -> Option<Document> {
        let idx = self.documents.iter().position(|d| d.name() == name)?;
        let doc = self.documents.remove(idx);
        self.active = match self.active {
            Some(a) if a == idx => None,
            Some(a) if a > idx => Some(a - 1),
            other => other,
        };
        Some(doc)
    }

    pub fn document_names(&self) -> Vec<&str> {
        self.documents.iter().map(Document::name).collect()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// 按引用查找对象
    pub fn resolve(&self, reference: &ObjectRef) -> Option<&DocumentObject> {
        self.get_document(&reference.document)?
            .object(&reference.object)
    }

    /// 沿链接找到最终目标对象
    pub fn resolve_link<'a>(&'a self, object: &'a DocumentObject) -> Option<&'a DocumentObject> {
        let mut current = object;
        for _ in 0..MAX_LINK_DEPTH {
            match &current.kind {
                ObjectKind::Link { document, object } => {
                    current = self.resolve(&ObjectRef::new(document.as_str(), object.as_str()))?;
                }
                _ => return Some(current),
            }
        }
        None
    }

    /// 重算文档，并校验其中所有链接的目标存在
    pub fn recompute(&mut self, name: &str) -> Result<usize, DocumentError> {
        let doc = self
            .get_document(name)
            .ok_or_else(|| DocumentError::DocumentNotFound(name.to_string()))?;
        for object in doc.objects() {
            if let ObjectKind::Link { .. } = object.kind {
                if self.resolve_link(object).is_none() {
                    let target = match &object.kind {
                        ObjectKind::Link { document, object } => format!("{}#{}", document, object),
                        _ => String::new(),
                    };
                    return Err(DocumentError::BrokenLink {
                        link: object.name.clone(),
                        target,
                    });
                }
            }
        }

        self.get_document_mut(name)
            .ok_or_else(|| DocumentError::DocumentNotFound(name.to_string()))?
            .recompute()
    }
}
