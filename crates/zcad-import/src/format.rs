//! 文件格式判定
//!
//! 仅按扩展名（不区分大小写）判断，不检查文件内容。

use std::fmt;
use std::path::Path;

/// 支持的文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Step,
    Iges,
    /// glTF，`binary` 为 true 时输出 `.glb`
    Gltf { binary: bool },
    Dxf,
    Unsupported,
}

impl FileFormat {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("stp") | Some("step") => FileFormat::Step,
            Some("igs") | Some("iges") => FileFormat::Iges,
            Some("glb") => FileFormat::Gltf { binary: true },
            Some("gltf") => FileFormat::Gltf { binary: false },
            Some("dxf") => FileFormat::Dxf,
            _ => FileFormat::Unsupported,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Step => "STEP",
            FileFormat::Iges => "IGES",
            FileFormat::Gltf { .. } => "glTF",
            FileFormat::Dxf => "DXF",
            FileFormat::Unsupported => "unsupported",
        }
    }

    /// 是否可通过 `open`/`insert` 导入
    pub fn can_import(&self) -> bool {
        matches!(self, FileFormat::Step | FileFormat::Iges)
    }

    /// 是否由 `export` 产生输出
    pub fn can_export(&self) -> bool {
        matches!(
            self,
            FileFormat::Step | FileFormat::Iges | FileFormat::Gltf { .. }
        )
    }

    /// 全部格式及其扩展名
    pub fn all() -> &'static [(FileFormat, &'static [&'static str])] {
        &[
            (FileFormat::Step, &["stp", "step"]),
            (FileFormat::Iges, &["igs", "iges"]),
            (FileFormat::Gltf { binary: true }, &["glb"]),
            (FileFormat::Gltf { binary: false }, &["gltf"]),
            (FileFormat::Dxf, &["dxf"]),
        ]
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(FileFormat::from_path("a.stp"), FileFormat::Step);
        assert_eq!(FileFormat::from_path("a.STEP"), FileFormat::Step);
        assert_eq!(FileFormat::from_path("dir/a.Igs"), FileFormat::Iges);
        assert_eq!(FileFormat::from_path("a.iges"), FileFormat::Iges);
        assert_eq!(
            FileFormat::from_path("a.GLB"),
            FileFormat::Gltf { binary: true }
        );
        assert_eq!(
            FileFormat::from_path("a.gltf"),
            FileFormat::Gltf { binary: false }
        );
        assert_eq!(FileFormat::from_path("a.dxf"), FileFormat::Dxf);
        assert_eq!(FileFormat::from_path("a.obj"), FileFormat::Unsupported);
        assert_eq!(FileFormat::from_path("step"), FileFormat::Unsupported);
    }

    #[test]
    fn test_capabilities() {
        assert!(FileFormat::Step.can_import());
        assert!(!FileFormat::Gltf { binary: true }.can_import());
        assert!(FileFormat::Gltf { binary: false }.can_export());
        assert!(!FileFormat::Dxf.can_export());
        assert!(!FileFormat::Unsupported.can_export());
    }
}
