//! 脚本层入口
//!
//! [`ImportModule`] 持有宿主应用、偏好设置和几何内核，把脚本层的六个方法
//! 转发到各个流程，并在边界处把内部错误翻译为 [`ScriptError`]。

use crate::args::{DxfReadRequest, DxfWriteRequest, ExportRequest, ImportRequest};
use crate::dxf_io::{read_dxf, write_dxf_objects, write_dxf_shapes};
use crate::error::ScriptError;
use crate::export::export_file;
use crate::import::import_file;
use crate::kernel::Kernel;
use crate::params::ParameterManager;
use crate::value::{Args, Value};
use zcad_core::Application;

/// 模块说明
pub const MODULE_DOC: &str = "This module is the Import module.";

/// 方法表项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Method {
    pub name: &'static str,
    pub doc: &'static str,
    /// 是否接受关键字参数
    pub keywords: bool,
}

pub const METHODS: &[Method] = &[
    Method {
        name: "open",
        doc: "open(string) -- Open the file and create a new document.",
        keywords: true,
    },
    Method {
        name: "insert",
        doc: "insert(string,string) -- Insert the file into the given document.",
        keywords: true,
    },
    Method {
        name: "export",
        doc: "export(list,string) -- Export a list of objects into a single file.",
        keywords: true,
    },
    Method {
        name: "readDXF",
        doc: "readDXF(filename,[document,ignore_errors,option_source]): Imports a DXF file \
              into the given document. ignore_errors is True by default.",
        keywords: false,
    },
    Method {
        name: "writeDXFShape",
        doc: "writeDXFShape([shape],filename [version,usePolyline,optionSource]): Exports \
              Shape(s) to a DXF file.",
        keywords: false,
    },
    Method {
        name: "writeDXFObject",
        doc: "writeDXFObject([objects],filename [,version,usePolyline,optionSource]): Exports \
              DocumentObject(s) to a DXF file.",
        keywords: false,
    },
];

/// 按名称查找方法
pub fn method(name: &str) -> Option<&'static Method> {
    METHODS.iter().find(|m| m.name == name)
}

pub struct ImportModule<K: Kernel> {
    app: Application,
    params: ParameterManager,
    kernel: K,
}

impl<K: Kernel> ImportModule<K> {
    pub fn new(kernel: K) -> Self {
        Self::with_params(kernel, ParameterManager::new())
    }

    pub fn with_params(kernel: K, params: ParameterManager) -> Self {
        Self {
            app: Application::new(),
            params,
            kernel,
        }
    }

    pub fn app(&self) -> &Application {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut Application {
        &mut self.app
    }

    pub fn params(&self) -> &ParameterManager {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterManager {
        &mut self.params
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// 按方法名分派
    pub fn call(&mut self, name: &str, args: &Args) -> Result<Value, ScriptError> {
        let method = method(name).ok_or_else(|| {
            ScriptError::Host(format!("module 'Import' has no attribute '{}'", name))
        })?;
        if !method.keywords && args.has_keywords() {
            return Err(ScriptError::Type(format!(
                "{}() takes no keyword arguments",
                method.name
            )));
        }
        tracing::debug!("Import.{}()", method.name);

        match method.name {
            "open" => self.open(args),
            "insert" => self.insert(args),
            "export" => self.export(args),
            "readDXF" => self.read_dxf(args),
            "writeDXFShape" => self.write_dxf_shape(args),
            _ => self.write_dxf_object(args),
        }
    }

    /// 打开文件到新文档（或 `docName` 指定的已有文档）
    ///
    /// 返回 `[(对象, [颜色...]), ...]`，只包含带逐面颜色的零件。
    pub fn open(&mut self, args: &Args) -> Result<Value, ScriptError> {
        self.import("open", args)
    }

    /// 插入文件到指定文档
    pub fn insert(&mut self, args: &Args) -> Result<Value, ScriptError> {
        self.import("insert", args)
    }

    fn import(&mut self, function: &'static str, args: &Args) -> Result<Value, ScriptError> {
        let request = ImportRequest::from_args(function, args)?;
        let outcome = import_file(&mut self.app, &self.kernel, &self.params, &request)?;
        if outcome.used_fallback {
            tracing::warn!("{} imported without colors", request.path.display());
        }

        let entries = outcome
            .part_colors
            .into_iter()
            .map(|pc| {
                let colors = pc.colors.into_iter().map(Value::Color).collect();
                Value::Tuple(vec![Value::Object(pc.object), Value::List(colors)])
            })
            .collect();
        Ok(Value::List(entries))
    }

    pub fn export(&mut self, args: &Args) -> Result<Value, ScriptError> {
        let request = ExportRequest::from_args(args)?;
        export_file(&self.app, &self.kernel, &self.params, &request)?;
        Ok(Value::None)
    }

    pub fn read_dxf(&mut self, args: &Args) -> Result<Value, ScriptError> {
        let request = DxfReadRequest::from_args(args)?;
        read_dxf(&mut self.app, &self.params, &request).map_err(|e| e.into_runtime())?;
        Ok(Value::None)
    }

    pub fn write_dxf_shape(&mut self, args: &Args) -> Result<Value, ScriptError> {
        let request = DxfWriteRequest::shapes_from_args(args)?;
        write_dxf_shapes(&self.params, &request).map_err(|e| e.into_runtime())?;
        Ok(Value::None)
    }

    pub fn write_dxf_object(&mut self, args: &Args) -> Result<Value, ScriptError> {
        let request = DxfWriteRequest::objects_from_args(args)?;
        write_dxf_objects(&self.app, &self.params, &request).map_err(|e| e.into_runtime())?;
        Ok(Value::None)
    }
}
