//! 参数适配
//!
//! 按声明的签名校验脚本层传入的位置参数/关键字参数，并转换为强类型的请求。
//! 规则与脚本层的参数解析保持一致：
//!
//! - 多余参数、未知关键字、重复给出的参数、缺失的必选参数 → `TypeError`
//! - 类型不符 → `TypeError`
//! - 路径/字符串编码非法（非 UTF-8 字节、内嵌 NUL）或整数越界 → `ValueError`
//!
//! 适配过程没有副作用，任何内核资源都在参数校验通过之后才会创建。

use crate::error::ScriptError;
use crate::value::{Args, Value};
use std::path::{Path, PathBuf};
use zcad_core::object::ObjectRef;

/// 参数的期望类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// 文件路径，接受字符串或 UTF-8 字节串
    Path,
    /// 字符串
    Str,
    /// 严格布尔值（整数不被接受）
    Bool,
    /// 0..=255 的整数，布尔值视为 0/1
    Byte,
    /// 32 位整数，布尔值视为 0/1
    Int,
    /// 任意值
    Any,
}

impl ParamKind {
    fn expected(&self) -> &'static str {
        match self {
            ParamKind::Path => "str, bytes or os.PathLike",
            ParamKind::Str => "str",
            ParamKind::Bool => "bool",
            ParamKind::Byte | ParamKind::Int => "int",
            ParamKind::Any => "object",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl Param {
    pub const fn new(name: &'static str, kind: ParamKind) -> Self {
        Self { name, kind }
    }
}

/// 函数签名
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub function: &'static str,
    pub params: &'static [Param],
    /// 前 `required` 个参数为必选
    pub required: usize,
    /// 是否接受关键字参数
    pub keywords: bool,
}

/// 转换后的参数值
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Path(PathBuf),
    Str(String),
    Bool(bool),
    Int(i64),
    Any(Value),
}

/// 绑定结果，按签名中的位置访问
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    slots: Vec<Option<Arg>>,
}

impl Bound {
    pub fn is_set(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        match self.slots.get(index)? {
            Some(Arg::Path(p)) => Some(p),
            _ => None,
        }
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        match self.slots.get(index)? {
            Some(Arg::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// 未给出时为 None，区别于显式的 false
    pub fn flag(&self, index: usize) -> Option<bool> {
        match self.slots.get(index)? {
            Some(Arg::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn int(&self, index: usize) -> Option<i64> {
        match self.slots.get(index)? {
            Some(Arg::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.slots.get(index)? {
            Some(Arg::Any(v)) => Some(v),
            _ => None,
        }
    }
}

impl Signature {
    /// 校验参数并按签名转换
    pub fn bind(&self, args: &Args) -> Result<Bound, ScriptError> {
        let f = self.function;
        if !self.keywords && args.has_keywords() {
            return Err(ScriptError::Type(format!("{}() takes no keyword arguments", f)));
        }
        if args.positional.len() > self.params.len() {
            return Err(ScriptError::Type(format!(
                "{}() takes at most {} arguments ({} given)",
                f,
                self.params.len(),
                args.positional.len() + args.keywords.len()
            )));
        }

        let mut slots: Vec<Option<Arg>> = vec![None; self.params.len()];
        for (i, value) in args.positional.iter().enumerate() {
            slots[i] = Some(self.convert(i, value)?);
        }
        for (key, value) in &args.keywords {
            let index = self
                .params
                .iter()
                .position(|p| p.name == key)
                .ok_or_else(|| {
                    ScriptError::Type(format!("'{}' is an invalid keyword argument for {}()", key, f))
                })?;
            if index < args.positional.len() {
                return Err(ScriptError::Type(format!(
                    "argument for {}() given by name ('{}') and position ({})",
                    f,
                    key,
                    index + 1
                )));
            }
            slots[index] = Some(self.convert(index, value)?);
        }

        for (i, param) in self.params.iter().take(self.required).enumerate() {
            if slots[i].is_none() {
                return Err(ScriptError::Type(format!(
                    "{}() missing required argument '{}' (pos {})",
                    f,
                    param.name,
                    i + 1
                )));
            }
        }

        Ok(Bound { slots })
    }

    fn convert(&self, index: usize, value: &Value) -> Result<Arg, ScriptError> {
        let param = &self.params[index];
        let mismatch = || {
            ScriptError::Type(format!(
                "{}() argument {} must be {}, not {}",
                self.function,
                index + 1,
                param.kind.expected(),
                value.type_name()
            ))
        };

        match (param.kind, value) {
            (ParamKind::Path, Value::Str(s)) => Ok(Arg::Path(PathBuf::from(no_nul(s)?))),
            (ParamKind::Path, Value::Bytes(bytes)) => {
                let s = std::str::from_utf8(bytes).map_err(|e| {
                    ScriptError::Value(format!("'utf-8' codec can't decode bytes: {}", e))
                })?;
                Ok(Arg::Path(PathBuf::from(no_nul(s)?)))
            }
            (ParamKind::Str, Value::Str(s)) => Ok(Arg::Str(no_nul(s)?.to_string())),
            (ParamKind::Bool, Value::Bool(b)) => Ok(Arg::Bool(*b)),
            (ParamKind::Byte, v) => {
                let n = as_int(v).ok_or_else(mismatch)?;
                if !(0..=255).contains(&n) {
                    return Err(ScriptError::Value(format!(
                        "unsigned byte integer out of range: {}",
                        n
                    )));
                }
                Ok(Arg::Bool(n != 0))
            }
            (ParamKind::Int, v) => {
                let n = as_int(v).ok_or_else(mismatch)?;
                if i32::try_from(n).is_err() {
                    return Err(ScriptError::Value(format!(
                        "signed integer is out of range: {}",
                        n
                    )));
                }
                Ok(Arg::Int(n))
            }
            (ParamKind::Any, v) => Ok(Arg::Any(v.clone())),
            _ => Err(mismatch()),
        }
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

fn no_nul(s: &str) -> Result<&str, ScriptError> {
    if s.contains('\0') {
        Err(ScriptError::Value("embedded null character".into()))
    } else {
        Ok(s)
    }
}

const IMPORT_PARAMS: &[Param] = &[
    Param::new("name", ParamKind::Path),
    Param::new("docName", ParamKind::Str),
    Param::new("importHidden", ParamKind::Bool),
    Param::new("merge", ParamKind::Bool),
    Param::new("useLinkGroup", ParamKind::Bool),
    Param::new("mode", ParamKind::Int),
];

const EXPORT_PARAMS: &[Param] = &[
    Param::new("obj", ParamKind::Any),
    Param::new("name", ParamKind::Path),
    Param::new("exportHidden", ParamKind::Bool),
    Param::new("legacy", ParamKind::Bool),
    Param::new("keepPlacement", ParamKind::Bool),
];

const READ_DXF_PARAMS: &[Param] = &[
    Param::new("name", ParamKind::Path),
    Param::new("document", ParamKind::Str),
    Param::new("ignore_errors", ParamKind::Byte),
    Param::new("option_source", ParamKind::Str),
];

const WRITE_DXF_PARAMS: &[Param] = &[
    Param::new("shapes", ParamKind::Any),
    Param::new("name", ParamKind::Path),
    Param::new("version", ParamKind::Int),
    Param::new("usePolyline", ParamKind::Any),
    Param::new("optionSource", ParamKind::Str),
];

/// `open` / `insert` 的请求
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    pub path: PathBuf,
    /// 目标文档名
    pub document: Option<String>,
    pub import_hidden: Option<bool>,
    pub merge: Option<bool>,
    pub use_link_group: Option<bool>,
    /// 导入模式，负数表示未设置
    pub mode: Option<i64>,
}

impl ImportRequest {
    pub fn from_args(function: &'static str, args: &Args) -> Result<Self, ScriptError> {
        let bound = Signature {
            function,
            params: IMPORT_PARAMS,
            required: 1,
            keywords: true,
        }
        .bind(args)?;

        Ok(Self {
            path: required_path(&bound, 0)?,
            document: bound.str(1).map(str::to_string),
            import_hidden: bound.flag(2),
            merge: bound.flag(3),
            use_link_group: bound.flag(4),
            mode: bound.int(5).filter(|m| *m >= 0),
        })
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: None,
            import_hidden: None,
            merge: None,
            use_link_group: None,
            mode: None,
        }
    }
}

/// `export` 的请求
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    /// 要导出的对象（非文档对象的条目已被忽略）
    pub objects: Vec<ObjectRef>,
    pub path: PathBuf,
    pub export_hidden: Option<bool>,
    pub legacy: Option<bool>,
    pub keep_placement: Option<bool>,
}

impl ExportRequest {
    pub fn from_args(args: &Args) -> Result<Self, ScriptError> {
        let bound = Signature {
            function: "export",
            params: EXPORT_PARAMS,
            required: 2,
            keywords: true,
        }
        .bind(args)?;

        let obj = bound.value(0).cloned().unwrap_or(Value::None);
        let items = obj.as_sequence().ok_or_else(|| {
            ScriptError::Type(format!("'{}' object is not iterable", obj.type_name()))
        })?;

        Ok(Self {
            objects: items.iter().filter_map(Value::as_object).cloned().collect(),
            path: required_path(&bound, 1)?,
            export_hidden: bound.flag(2),
            legacy: bound.flag(3),
            keep_placement: bound.flag(4),
        })
    }

    pub fn new(objects: Vec<ObjectRef>, path: impl Into<PathBuf>) -> Self {
        Self {
            objects,
            path: path.into(),
            export_hidden: None,
            legacy: None,
            keep_placement: None,
        }
    }
}

/// `readDXF` 的请求
#[derive(Debug, Clone, PartialEq)]
pub struct DxfReadRequest {
    pub path: PathBuf,
    pub document: Option<String>,
    pub ignore_errors: bool,
    pub option_source: Option<String>,
}

impl DxfReadRequest {
    pub fn from_args(args: &Args) -> Result<Self, ScriptError> {
        let bound = Signature {
            function: "readDXF",
            params: READ_DXF_PARAMS,
            required: 1,
            keywords: false,
        }
        .bind(args)?;

        Ok(Self {
            path: required_path(&bound, 0)?,
            document: bound.str(1).map(str::to_string),
            ignore_errors: bound.flag(2).unwrap_or(true),
            option_source: bound.str(3).map(str::to_string),
        })
    }
}

/// `writeDXFShape` / `writeDXFObject` 的请求
#[derive(Debug, Clone, PartialEq)]
pub struct DxfWriteRequest {
    /// 待写出的实体，单个实体已规范化为单元素列表
    pub entities: Vec<Value>,
    pub path: PathBuf,
    /// 版本覆盖，仅 12 和 14 生效
    pub version: Option<u32>,
    /// 参数恰好为 True 时强制输出多段线
    pub poly_override: bool,
    pub option_source: Option<String>,
}

impl DxfWriteRequest {
    /// 解析 `writeDXFShape` 参数
    pub fn shapes_from_args(args: &Args) -> Result<Self, ScriptError> {
        Self::parse("writeDXFShape", args, |v| matches!(v, Value::Shape(_)))
            .ok_or_else(|| ScriptError::Type("expected ([Shape],path".into()))
    }

    /// 解析 `writeDXFObject` 参数
    pub fn objects_from_args(args: &Args) -> Result<Self, ScriptError> {
        Self::parse("writeDXFObject", args, |v| matches!(v, Value::Object(_)))
            .ok_or_else(|| ScriptError::Type("expected ([DocObject],path".into()))
    }

    /// 任何解析失败都折叠为调用方给出的统一类型错误
    fn parse(function: &'static str, args: &Args, is_entity: fn(&Value) -> bool) -> Option<Self> {
        let bound = Signature {
            function,
            params: WRITE_DXF_PARAMS,
            required: 2,
            keywords: false,
        }
        .bind(args)
        .ok()?;

        let entities = match bound.value(0)? {
            Value::List(items) => items.iter().filter(|v| is_entity(v)).cloned().collect(),
            single if is_entity(single) => vec![single.clone()],
            _ => return None,
        };

        Some(Self {
            entities,
            path: bound.path(1)?.to_path_buf(),
            version: bound
                .int(2)
                .filter(|v| *v == 12 || *v == 14)
                .map(|v| v as u32),
            poly_override: matches!(bound.value(3), Some(Value::Bool(true))),
            option_source: bound.str(4).map(str::to_string),
        })
    }
}

fn required_path(bound: &Bound, index: usize) -> Result<PathBuf, ScriptError> {
    bound
        .path(index)
        .map(Path::to_path_buf)
        .ok_or_else(|| ScriptError::Type("path argument required".into()))
}
