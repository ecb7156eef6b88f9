//! 偏好设置存储
//!
//! 层次化的参数组，每组按类型保存布尔、整数、浮点和字符串参数，并可嵌套子组。
//! 参数组用 `User parameter:BaseApp/Preferences/Mod/Import` 这样的路径定位，
//! 整个存储以 JSON 持久化到用户配置目录。

use crate::error::ParamError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

const USER_PREFIX: &str = "User parameter";
const SYSTEM_PREFIX: &str = "System parameter";

static EMPTY_GROUP: ParamGroup = ParamGroup::EMPTY;

/// 参数组
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGroup {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    bools: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    ints: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    floats: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    strings: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    groups: BTreeMap<String, ParamGroup>,
}

/// 单个参数值
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// 从命令行文本推断类型：true/false → 布尔，整数，浮点，其余为字符串
    pub fn parse(text: &str) -> Self {
        match text {
            "true" | "True" => return ParamValue::Bool(true),
            "false" | "False" => return ParamValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = text.parse::<i64>() {
            return ParamValue::Int(i);
        }
        if let Ok(f) = text.parse::<f64>() {
            return ParamValue::Float(f);
        }
        ParamValue::Str(text.to_string())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl ParamGroup {
    pub const EMPTY: ParamGroup = ParamGroup {
        bools: BTreeMap::new(),
        ints: BTreeMap::new(),
        floats: BTreeMap::new(),
        strings: BTreeMap::new(),
        groups: BTreeMap::new(),
    };

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.bools.get(key).copied().unwrap_or(default)
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.bools.insert(key.to_string(), value);
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.ints.get(key).copied().unwrap_or(default)
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.ints.insert(key.to_string(), value);
    }

    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        self.floats.get(key).copied().unwrap_or(default)
    }

    pub fn set_float(&mut self, key: &str, value: f64) {
        self.floats.insert(key.to_string(), value);
    }

    pub fn get_ascii(&self, key: &str, default: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn set_ascii(&mut self, key: &str, value: &str) {
        self.strings.insert(key.to_string(), value.to_string());
    }

    /// 按任意类型查找参数
    pub fn get(&self, key: &str) -> Option<ParamValue> {
        if let Some(v) = self.bools.get(key) {
            return Some(ParamValue::Bool(*v));
        }
        if let Some(v) = self.ints.get(key) {
            return Some(ParamValue::Int(*v));
        }
        if let Some(v) = self.floats.get(key) {
            return Some(ParamValue::Float(*v));
        }
        self.strings.get(key).map(|v| ParamValue::Str(v.clone()))
    }

    /// 写入参数，同名的其他类型参数会被移除
    pub fn set(&mut self, key: &str, value: ParamValue) {
        self.remove(key);
        match value {
            ParamValue::Bool(v) => self.set_bool(key, v),
            ParamValue::Int(v) => self.set_int(key, v),
            ParamValue::Float(v) => self.set_float(key, v),
            ParamValue::Str(v) => self.set_ascii(key, &v),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.bools.remove(key);
        self.ints.remove(key);
        self.floats.remove(key);
        self.strings.remove(key);
    }

    /// 本组所有参数（按名称排序）
    pub fn entries(&self) -> Vec<(String, ParamValue)> {
        let mut out: Vec<(String, ParamValue)> = self
            .bools
            .iter()
            .map(|(k, v)| (k.clone(), ParamValue::Bool(*v)))
            .chain(self.ints.iter().map(|(k, v)| (k.clone(), ParamValue::Int(*v))))
            .chain(self.floats.iter().map(|(k, v)| (k.clone(), ParamValue::Float(*v))))
            .chain(self.strings.iter().map(|(k, v)| (k.clone(), ParamValue::Str(v.clone()))))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// 子组名称
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// 按 `A/B/C` 路径查找子组
    pub fn group(&self, path: &str) -> Option<&ParamGroup> {
        segments(path).try_fold(self, |group, name| group.groups.get(name))
    }

    /// 按路径获取子组，不存在时创建
    pub fn group_mut(&mut self, path: &str) -> &mut ParamGroup {
        segments(path).fold(self, |group, name| {
            group.groups.entry(name.to_string()).or_default()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bools.is_empty()
            && self.ints.is_empty()
            && self.floats.is_empty()
            && self.strings.is_empty()
            && self.groups.is_empty()
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredParameters {
    #[serde(default)]
    user: ParamGroup,
    #[serde(default)]
    system: ParamGroup,
}

/// 参数管理器，持有用户和系统两棵参数树
#[derive(Debug, Default)]
pub struct ParameterManager {
    user: ParamGroup,
    system: ParamGroup,
    path: Option<PathBuf>,
}

impl ParameterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 默认存储位置：`<config_dir>/zcad/parameters.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zcad").join("parameters.json"))
    }

    /// 从文件加载，文件不存在时返回空参数并记住路径
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParamError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("parameter file {} not found, using defaults", path.display());
            return Ok(Self {
                path: Some(path.to_path_buf()),
                ..Self::default()
            });
        }

        let content = std::fs::read_to_string(path)?;
        let stored: StoredParameters = serde_json::from_str(&content)?;
        tracing::debug!("loaded parameters from {}", path.display());
        Ok(Self {
            user: stored.user,
            system: stored.system,
            path: Some(path.to_path_buf()),
        })
    }

    /// 保存到加载时的文件
    pub fn save(&self) -> Result<(), ParamError> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Err(ParamError::InvalidPath(
                "parameter store has no file location".into(),
            )),
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ParamError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredParameters {
            user: self.user.clone(),
            system: self.system.clone(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn user_group(&self, path: &str) -> &ParamGroup {
        self.user.group(path).unwrap_or(&EMPTY_GROUP)
    }

    pub fn user_group_mut(&mut self, path: &str) -> &mut ParamGroup {
        self.user.group_mut(path)
    }

    /// 按完整路径查找参数组，如 `User parameter:BaseApp/Preferences/Mod/Draft`
    ///
    /// 组不存在时返回空组，读取方会得到各参数的默认值。
    pub fn group_by_path(&self, full_path: &str) -> Result<&ParamGroup, ParamError> {
        let (root, path) = self.split_path(full_path)?;
        Ok(root.group(path).unwrap_or(&EMPTY_GROUP))
    }

    pub fn group_by_path_mut(&mut self, full_path: &str) -> Result<&mut ParamGroup, ParamError> {
        let (prefix, path) = full_path
            .split_once(':')
            .ok_or_else(|| ParamError::InvalidPath(full_path.to_string()))?;
        let root = match prefix {
            USER_PREFIX => &mut self.user,
            SYSTEM_PREFIX => &mut self.system,
            _ => return Err(ParamError::InvalidPath(full_path.to_string())),
        };
        Ok(root.group_mut(path))
    }

    fn split_path<'a>(&self, full_path: &'a str) -> Result<(&ParamGroup, &'a str), ParamError> {
        let (prefix, path) = full_path
            .split_once(':')
            .ok_or_else(|| ParamError::InvalidPath(full_path.to_string()))?;
        match prefix {
            USER_PREFIX => Ok((&self.user, path)),
            SYSTEM_PREFIX => Ok((&self.system, path)),
            _ => Err(ParamError::InvalidPath(full_path.to_string())),
        }
    }
}
