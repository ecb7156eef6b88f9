//! 文档数据模型

use crate::error::DocumentError;
use crate::id::ObjectId;
use crate::layer::LayerManager;
use crate::object::{DocumentObject, ObjectKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// 文档元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// 文档唯一标识
    pub id: Uuid,

    /// 文档标题
    pub label: String,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 最后修改时间
    pub modified_at: DateTime<Utc>,

    /// 单位（模型内部统一使用毫米）
    pub units: String,
}

impl DocumentMetadata {
    fn new(label: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.to_string(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
            units: "mm".to_string(),
        }
    }
}

/// 文档
#[derive(Debug)]
pub struct Document {
    name: String,

    /// 元数据
    pub metadata: DocumentMetadata,

    /// 按创建顺序保存的对象
    objects: Vec<DocumentObject>,

    /// 名称到下标的索引
    by_name: HashMap<String, usize>,

    /// 图层表
    pub layers: LayerManager,

    /// 自上次重算后有改动的对象
    touched: HashSet<ObjectId>,

    recompute_count: u64,
}

impl Document {
    /// 创建新文档
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            metadata: DocumentMetadata::new(&name),
            name,
            objects: Vec::new(),
            by_name: HashMap::new(),
            layers: LayerManager::new(),
            touched: HashSet::new(),
            recompute_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 添加对象，名称冲突时追加 001、002… 后缀
    pub fn add_object(&mut self, base_name: &str, kind: ObjectKind) -> &mut DocumentObject {
        let name = self.unique_name(base_name);
        let mut object = DocumentObject::new(name.clone(), kind);
        if !base_name.is_empty() {
            object.label = base_name.to_string();
        }
        self.touched.insert(object.id);
        self.by_name.insert(name, self.objects.len());
        self.objects.push(object);
        let last = self.objects.len() - 1;
        &mut self.objects[last]
    }

    /// 生成文档内唯一的内部名称
    pub fn unique_name(&self, base_name: &str) -> String {
        let base = sanitize_name(base_name);
        let mut name = base.clone();
        let mut suffix = 1;
        while self.by_name.contains_key(&name) {
            name = format!("{}{:03}", base, suffix);
            suffix += 1;
        }
        name
    }

    /// 将对象加入容器
    pub fn add_child(&mut self, parent: &str, child: &str) -> Result<(), DocumentError> {
        let child_id = self
            .object(child)
            .map(|o| o.id)
            .ok_or_else(|| self.not_found(child))?;
        if self.parent_of(child_id).is_some() {
            return Err(DocumentError::AlreadyParented {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        let idx = *self.by_name.get(parent).ok_or_else(|| self.not_found(parent))?;
        let parent_obj = &mut self.objects[idx];
        let parent_id = parent_obj.id;
        let children = parent_obj
            .children_mut()
            .ok_or_else(|| DocumentError::NotAContainer(parent.to_string()))?;
        children.push(child_id);
        self.touched.insert(parent_id);
        Ok(())
    }

    /// 获取对象（按内部名称）
    pub fn object(&self, name: &str) -> Option<&DocumentObject> {
        self.by_name.get(name).map(|&i| &self.objects[i])
    }

    pub fn object_by_id(&self, id: ObjectId) -> Option<&DocumentObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// 删除对象，同时从所有容器中移除
    pub fn remove_object(&mut self, name: &str) -> Option<DocumentObject> {
        let idx = self.by_name.remove(name)?;
        let removed = self.objects.remove(idx);
        for object in &mut self.objects {
            if let Some(children) = object.children_mut() {
                children.retain(|c| *c != removed.id);
            }
        }
        self.by_name = self
            .objects
            .iter()
            .enumerate()
            .map(|(i, o)| (o.name.clone(), i))
            .collect();
        self.touched.remove(&removed.id);
        Some(removed)
    }

    /// 包含该对象的容器
    pub fn parent_of(&self, id: ObjectId) -> Option<&DocumentObject> {
        self.objects.iter().find(|o| o.children().contains(&id))
    }

    /// 不属于任何容器的对象
    pub fn root_objects(&self) -> impl Iterator<Item = &DocumentObject> {
        self.objects
            .iter()
            .filter(move |o| self.parent_of(o.id).is_none())
    }

    /// 获取所有对象
    pub fn objects(&self) -> impl Iterator<Item = &DocumentObject> {
        self.objects.iter()
    }

    /// 获取对象数量
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// 重算文档：校验容器引用并清除修改标记，返回被重算的对象数
    pub fn recompute(&mut self) -> Result<usize, DocumentError> {
        let ids: HashSet<ObjectId> = self.objects.iter().map(|o| o.id).collect();
        for object in &self.objects {
            if let Some(missing) = object.children().iter().find(|c| !ids.contains(c)) {
                return Err(DocumentError::DanglingChild {
                    group: object.name.clone(),
                    child: missing.raw(),
                });
            }
        }

        let count = self.touched.len();
        self.touched.clear();
        self.recompute_count += 1;
        self.metadata.modified_at = Utc::now();
        tracing::debug!("recomputed {} object(s) in '{}'", count, self.name);
        Ok(count)
    }

    /// 是否有未重算的修改
    pub fn is_touched(&self) -> bool {
        !self.touched.is_empty()
    }

    /// 已执行的重算次数
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    fn not_found(&self, object: &str) -> DocumentError {
        DocumentError::ObjectNotFound {
            document: self.name.clone(),
            object: object.to_string(),
        }
    }
}

/// 把任意标签转换为合法的内部名称（字母数字和下划线，不以数字开头）
pub fn sanitize_name(label: &str) -> String {
    let mut name: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() {
        name.push_str("Unnamed");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
