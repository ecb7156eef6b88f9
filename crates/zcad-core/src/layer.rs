//! 图层管理
//!
//! 文档的图层表，由 DXF 导入填充，DXF 导出时按图层名分组实体。

use crate::properties::Color;
use serde::{Deserialize, Serialize};

/// 图层定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// 图层名称
    pub name: String,

    /// 图层颜色
    pub color: Color,

    /// 是否可见
    pub visible: bool,

    /// 是否冻结
    pub frozen: bool,
}

impl Layer {
    /// 创建新图层
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Color::WHITE,
            visible: true,
            frozen: false,
        }
    }

    /// 默认图层（0层）
    pub fn default_layer() -> Self {
        Self::new("0")
    }

    /// 设置颜色
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// 图层管理器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerManager {
    layers: Vec<Layer>,
}

impl LayerManager {
    /// 创建新的图层管理器（仅含0层）
    pub fn new() -> Self {
        Self {
            layers: vec![Layer::default_layer()],
        }
    }

    /// 添加或替换同名图层
    pub fn add_layer(&mut self, layer: Layer) {
        match self.layers.iter_mut().find(|l| l.name == layer.name) {
            Some(existing) => *existing = layer,
            None => self.layers.push(layer),
        }
    }

    /// 获取图层（按名称）
    pub fn get_layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// 图层数量
    pub fn count(&self) -> usize {
        self.layers.len()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_manager() {
        let mut manager = LayerManager::new();
        assert_eq!(manager.count(), 1);
        assert!(manager.get_layer("0").is_some());

        manager.add_layer(Layer::new("Walls").with_color(Color::RED));
        manager.add_layer(Layer::new("Walls").with_color(Color::BLUE));

        assert_eq!(manager.count(), 2);
        assert_eq!(manager.get_layer("Walls").map(|l| l.color), Some(Color::BLUE));
    }
}
