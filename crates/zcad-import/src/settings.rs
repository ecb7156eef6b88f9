//! 导入导出相关的偏好设置
//!
//! 从参数存储读取带默认值的强类型设置。调用参数中显式给出的选项会覆盖这里的值。

use crate::params::ParameterManager;
use crate::APP_NAME;

/// 导入导出通用设置所在的参数组
pub const IMPORT_GROUP: &str = "BaseApp/Preferences/Mod/Import";
/// STEP 文件头设置
pub const STEP_GROUP: &str = "BaseApp/Preferences/Mod/Part/STEP";
/// IGES 设置
pub const IGES_GROUP: &str = "BaseApp/Preferences/Mod/Part/IGES";
/// `readDXF` 默认的选项来源
pub const DXF_READ_SOURCE: &str = "User parameter:BaseApp/Preferences/Mod/Draft";
/// `writeDXFShape` / `writeDXFObject` 默认的选项来源
pub const DXF_WRITE_SOURCE: &str = "User parameter:BaseApp/Preferences/Mod/Import";

/// 导入模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// 全部导入目标文档
    #[default]
    SingleDocument,
    /// 在目标文档中以一个分组容纳全部导入对象
    GroupPerDocument,
    /// 同上，分组以文件所在目录命名
    GroupPerDirectory,
    /// 每个顶层装配放入单独的新文档，目标文档中放置链接
    ObjectPerDocument,
    /// 同上，新文档以目录和装配名命名
    ObjectPerDirectory,
}

impl ImportMode {
    pub fn from_raw(mode: i64) -> Option<Self> {
        match mode {
            0 => Some(ImportMode::SingleDocument),
            1 => Some(ImportMode::GroupPerDocument),
            2 => Some(ImportMode::GroupPerDirectory),
            3 => Some(ImportMode::ObjectPerDocument),
            4 => Some(ImportMode::ObjectPerDirectory),
            _ => None,
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(
            self,
            ImportMode::GroupPerDocument | ImportMode::GroupPerDirectory
        )
    }

    pub fn splits_documents(&self) -> bool {
        matches!(
            self,
            ImportMode::ObjectPerDocument | ImportMode::ObjectPerDirectory
        )
    }

    pub fn uses_directory_name(&self) -> bool {
        matches!(
            self,
            ImportMode::GroupPerDirectory | ImportMode::ObjectPerDirectory
        )
    }
}

/// 导入选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// 合并为单个复合形状
    pub merge: bool,
    pub import_hidden: bool,
    pub use_link_group: bool,
    pub mode: ImportMode,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            merge: false,
            import_hidden: true,
            use_link_group: true,
            mode: ImportMode::SingleDocument,
        }
    }
}

impl ImportOptions {
    pub fn from_params(params: &ParameterManager) -> Self {
        let group = params.user_group(IMPORT_GROUP);
        let defaults = Self::default();
        let mut options = Self {
            merge: group.get_bool("ReadShapeCompoundMode", defaults.merge),
            import_hidden: group.get_bool("ImportHiddenObject", defaults.import_hidden),
            use_link_group: group.get_bool("UseLinkGroup", defaults.use_link_group),
            mode: defaults.mode,
        };
        options.set_mode(group.get_int("ImportMode", 0));
        options
    }

    /// 设置导入模式，无效值被忽略
    pub fn set_mode(&mut self, mode: i64) {
        match ImportMode::from_raw(mode) {
            Some(m) => self.mode = m,
            None => tracing::warn!("ignoring invalid import mode {}", mode),
        }
    }
}

/// 导出选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub export_hidden: bool,
    pub keep_placement: bool,
    /// 优先使用扁平（旧版）导出路径
    pub legacy: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            export_hidden: true,
            keep_placement: false,
            legacy: false,
        }
    }
}

impl ExportOptions {
    pub fn from_params(params: &ParameterManager) -> Self {
        let group = params.user_group(IMPORT_GROUP);
        let defaults = Self::default();
        Self {
            export_hidden: group.get_bool("ExportHiddenObject", defaults.export_hidden),
            keep_placement: group.get_bool("ExportKeepPlacement", defaults.keep_placement),
            legacy: group.get_bool("ExportLegacy", defaults.legacy),
        }
    }
}

/// STEP 文件头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepHeader {
    pub author: String,
    pub organization: String,
    pub originating_system: String,
    pub description: String,
}

impl StepHeader {
    pub fn from_params(params: &ParameterManager) -> Self {
        let group = params.user_group(STEP_GROUP);
        Self {
            author: group.get_ascii("Author", "Author"),
            organization: group.get_ascii("Company", ""),
            originating_system: APP_NAME.to_string(),
            description: format!("{} Model", APP_NAME),
        }
    }
}

/// IGES 全局段中的文件头信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgesHeader {
    pub author: String,
    pub company: String,
    pub product: String,
}

/// IGES 设置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgesSettings {
    pub header: IgesHeader,
    /// 读取时跳过空白（不可见）实体
    pub skip_blank_entities: bool,
}

impl IgesSettings {
    pub fn from_params(params: &ParameterManager) -> Self {
        let group = params.user_group(IGES_GROUP);
        Self {
            header: IgesHeader {
                author: group.get_ascii("Author", ""),
                company: group.get_ascii("Company", ""),
                product: group.get_ascii("Product", APP_NAME),
            },
            skip_blank_entities: group.get_bool("SkipBlankEntities", true),
        }
    }
}
