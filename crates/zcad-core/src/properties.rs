//! 对象的视觉属性
//!
//! 包含颜色、整体着色和逐面颜色列表。

use serde::{Deserialize, Serialize};

/// RGBA颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// 从十六进制值创建（如 0xFF0000 表示红色）
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
            a: 255,
        }
    }

    /// 从 [0.0, 1.0] 范围的浮点分量创建
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            a: channel(a),
        }
    }

    /// 转换为 [0.0, 1.0] 范围的浮点数组
    pub fn to_f32_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    pub fn to_hex(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    // 预定义颜色（AutoCAD ACI颜色兼容）
    pub const RED: Color = Color::new(255, 0, 0);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const MAGENTA: Color = Color::new(255, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const GRAY: Color = Color::new(128, 128, 128);

    /// 零件默认着色
    pub const DEFAULT_SHAPE: Color = Color::new(204, 204, 204);
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT_SHAPE
    }
}

/// 对象的外观属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    /// 整体颜色（None = 使用默认着色）
    pub shape_color: Option<Color>,
    /// 逐面颜色列表，与形状的面一一对应
    pub diffuse_colors: Vec<Color>,
    /// 是否可见
    pub visible: bool,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            shape_color: None,
            diffuse_colors: Vec::new(),
            visible: true,
        }
    }
}

impl Appearance {
    /// 创建带有指定颜色的外观
    pub fn with_color(color: Color) -> Self {
        Self {
            shape_color: Some(color),
            ..Default::default()
        }
    }

    /// 设置可见性
    pub fn set_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// 设置逐面颜色
    pub fn set_diffuse_colors(mut self, colors: Vec<Color>) -> Self {
        self.diffuse_colors = colors;
        self
    }

    /// 是否带有逐面颜色
    pub fn has_face_colors(&self) -> bool {
        !self.diffuse_colors.is_empty()
    }
}
