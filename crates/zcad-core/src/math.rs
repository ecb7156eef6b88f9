//! 数学基础类型
//!
//! 基于 nalgebra 提供的向量、点和刚体变换类型的别名。

use nalgebra as na;
use serde::{Deserialize, Serialize};

/// 3D点类型
pub type Point3 = na::Point3<f64>;

/// 3D向量类型
pub type Vector3 = na::Vector3<f64>;

/// 对象放置（平移 + 旋转）
pub type Placement = na::Isometry3<f64>;

/// 数值容差，用于几何比较
pub const EPSILON: f64 = 1e-10;

/// 判断两个浮点数是否近似相等
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// 判断两个3D点是否近似相等（指定容差）
#[inline]
pub fn points_near(a: &Point3, b: &Point3, tolerance: f64) -> bool {
    (a - b).norm() <= tolerance
}

/// 纯平移的放置
pub fn translation(x: f64, y: f64, z: f64) -> Placement {
    Placement::translation(x, y, z)
}

/// 绕Z轴旋转（弧度）后平移的放置
pub fn placement_z(x: f64, y: f64, z: f64, angle: f64) -> Placement {
    Placement::new(Vector3::new(x, y, z), Vector3::z() * angle)
}

/// 3D包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox3 {
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// 创建空的包围盒（无效状态）
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    /// 从点集创建包围盒
    pub fn from_points(points: impl IntoIterator<Item = Point3>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    /// 扩展包围盒以包含指定点
    pub fn expand_to_include(&mut self, point: &Point3) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// 合并两个包围盒
    pub fn union(&self, other: &Self) -> Self {
        let mut bbox = *self;
        if other.is_valid() {
            bbox.expand_to_include(&other.min);
            bbox.expand_to_include(&other.max);
        }
        bbox
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn size(&self) -> Vector3 {
        if self.is_valid() {
            self.max - self.min
        } else {
            Vector3::zeros()
        }
    }
}
