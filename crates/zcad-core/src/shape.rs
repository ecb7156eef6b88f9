//! 形状数据
//!
//! 精确的 B-rep 表示由几何内核持有。宿主侧只保存拓扑类型、面数量和边界曲线，
//! 这些信息足以存放在文档对象中并驱动 DXF 输出。

use crate::math::{BoundingBox3, Placement, Point3, Vector3, EPSILON};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// 离散化时的最大段数
const MAX_SEGMENTS: usize = 4096;

/// 整圆离散化的最少段数
const MIN_SEGMENTS_PER_TURN: f64 = 32.0;

/// 拓扑类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Compound,
    Solid,
    Shell,
    Face,
    Wire,
    Edge,
    Vertex,
}

/// 边的几何曲线
///
/// 角度均为弧度，圆弧和椭圆弧沿法向逆时针方向从起点扫到终点。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    Line {
        start: Point3,
        end: Point3,
    },
    Circle {
        center: Point3,
        normal: Vector3,
        radius: f64,
    },
    Arc {
        center: Point3,
        normal: Vector3,
        /// 角度零点方向
        x_axis: Vector3,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Ellipse {
        center: Point3,
        normal: Vector3,
        /// 长轴（长度即长半轴）
        major_axis: Vector3,
        /// 短轴/长轴
        ratio: f64,
        start_param: f64,
        end_param: f64,
    },
    BSpline {
        degree: u32,
        poles: Vec<Point3>,
        /// 节点向量，为空时按夹紧均匀节点处理
        knots: Vec<f64>,
        closed: bool,
    },
    Polyline {
        points: Vec<Point3>,
        closed: bool,
    },
}

impl Curve {
    pub fn line(start: Point3, end: Point3) -> Self {
        Curve::Line { start, end }
    }

    /// XY平面上的整圆
    pub fn circle(center: Point3, radius: f64) -> Self {
        Curve::Circle {
            center,
            normal: Vector3::z(),
            radius,
        }
    }

    /// XY平面上的圆弧
    pub fn arc(center: Point3, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Curve::Arc {
            center,
            normal: Vector3::z(),
            x_axis: Vector3::x(),
            radius,
            start_angle,
            end_angle,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Curve::Line { .. } => "Line",
            Curve::Circle { .. } => "Circle",
            Curve::Arc { .. } => "Arc",
            Curve::Ellipse { .. } => "Ellipse",
            Curve::BSpline { .. } => "BSpline",
            Curve::Polyline { .. } => "Polyline",
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Curve::Line { .. } | Curve::Arc { .. } => false,
            Curve::Circle { .. } => true,
            Curve::Ellipse {
                start_param,
                end_param,
                ..
            } => is_full_turn(*start_param, *end_param),
            Curve::BSpline { closed, .. } | Curve::Polyline { closed, .. } => *closed,
        }
    }

    /// 曲线所在平面的法向是否为 +Z
    pub fn is_planar_xy(&self) -> bool {
        match self {
            Curve::Circle { normal, .. }
            | Curve::Arc { normal, .. }
            | Curve::Ellipse { normal, .. } => {
                let n = normal.normalize();
                (n - Vector3::z()).norm() < 1e-9
            }
            Curve::Line { .. } | Curve::BSpline { .. } | Curve::Polyline { .. } => true,
        }
    }

    /// 应用放置变换
    pub fn transformed(&self, placement: &Placement) -> Curve {
        let p = |pt: &Point3| placement * pt;
        let v = |vec: &Vector3| placement.rotation * vec;
        match self {
            Curve::Line { start, end } => Curve::Line {
                start: p(start),
                end: p(end),
            },
            Curve::Circle {
                center,
                normal,
                radius,
            } => Curve::Circle {
                center: p(center),
                normal: v(normal),
                radius: *radius,
            },
            Curve::Arc {
                center,
                normal,
                x_axis,
                radius,
                start_angle,
                end_angle,
            } => Curve::Arc {
                center: p(center),
                normal: v(normal),
                x_axis: v(x_axis),
                radius: *radius,
                start_angle: *start_angle,
                end_angle: *end_angle,
            },
            Curve::Ellipse {
                center,
                normal,
                major_axis,
                ratio,
                start_param,
                end_param,
            } => Curve::Ellipse {
                center: p(center),
                normal: v(normal),
                major_axis: v(major_axis),
                ratio: *ratio,
                start_param: *start_param,
                end_param: *end_param,
            },
            Curve::BSpline {
                degree,
                poles,
                knots,
                closed,
            } => Curve::BSpline {
                degree: *degree,
                poles: poles.iter().map(p).collect(),
                knots: knots.clone(),
                closed: *closed,
            },
            Curve::Polyline { points, closed } => Curve::Polyline {
                points: points.iter().map(p).collect(),
                closed: *closed,
            },
        }
    }

    /// 按最大段长离散化为点列
    ///
    /// 闭合曲线的首点不会在末尾重复。
    pub fn sample(&self, max_segment: f64) -> Vec<Point3> {
        match self {
            Curve::Line { start, end } => vec![*start, *end],
            Curve::Circle {
                center,
                normal,
                radius,
            } => {
                let x = any_perpendicular(normal) * *radius;
                let y = normal.normalize().cross(&x);
                let n = angular_segments(TAU, *radius, max_segment);
                (0..n)
                    .map(|i| {
                        let t = TAU * i as f64 / n as f64;
                        *center + x * t.cos() + y * t.sin()
                    })
                    .collect()
            }
            Curve::Arc {
                center,
                normal,
                x_axis,
                radius,
                start_angle,
                end_angle,
            } => {
                let x = x_axis.normalize() * *radius;
                let y = normal.normalize().cross(&x);
                let sweep = sweep_angle(*start_angle, *end_angle);
                let n = angular_segments(sweep, *radius, max_segment);
                (0..=n)
                    .map(|i| {
                        let t = start_angle + sweep * i as f64 / n as f64;
                        *center + x * t.cos() + y * t.sin()
                    })
                    .collect()
            }
            Curve::Ellipse {
                center,
                normal,
                major_axis,
                ratio,
                start_param,
                end_param,
            } => {
                let minor = normal.normalize().cross(major_axis) * *ratio;
                let full = is_full_turn(*start_param, *end_param);
                let sweep = if full {
                    TAU
                } else {
                    sweep_angle(*start_param, *end_param)
                };
                let n = angular_segments(sweep, major_axis.norm(), max_segment);
                let count = if full { n } else { n + 1 };
                (0..count)
                    .map(|i| {
                        let t = start_param + sweep * i as f64 / n as f64;
                        *center + *major_axis * t.cos() + minor * t.sin()
                    })
                    .collect()
            }
            Curve::BSpline {
                degree,
                poles,
                knots,
                ..
            } => sample_bspline(*degree as usize, poles, knots, max_segment),
            Curve::Polyline { points, .. } => points.clone(),
        }
    }

    /// 曲线退化（零长度、非正半径等）时返回原因
    pub fn degeneracy(&self) -> Option<&'static str> {
        match self {
            Curve::Line { start, end } if (end - start).norm() < EPSILON => {
                Some("zero-length line")
            }
            Curve::Circle { radius, .. } | Curve::Arc { radius, .. } if *radius <= EPSILON => {
                Some("non-positive radius")
            }
            Curve::Ellipse {
                major_axis, ratio, ..
            } if major_axis.norm() < EPSILON || *ratio <= 0.0 || *ratio > 1.0 => {
                Some("invalid ellipse axes")
            }
            Curve::BSpline { degree, poles, .. }
                if *degree == 0 || poles.len() < *degree as usize + 1 =>
            {
                Some("not enough control points for degree")
            }
            Curve::Polyline { points, .. } if points.len() < 2 => Some("fewer than two vertices"),
            _ => None,
        }
    }
}

fn is_full_turn(start: f64, end: f64) -> bool {
    ((end - start).abs() - TAU).abs() < 1e-9
}

/// 从起始角到终止角的逆时针扫角，落在 (0, 2π]
fn sweep_angle(start: f64, end: f64) -> f64 {
    let sweep = (end - start).rem_euclid(TAU);
    if sweep < EPSILON {
        TAU
    } else {
        sweep
    }
}

fn segments_for(length: f64, max_segment: f64) -> usize {
    if max_segment <= 0.0 || !max_segment.is_finite() {
        return 1;
    }
    ((length / max_segment).ceil() as usize).clamp(1, MAX_SEGMENTS)
}

fn angular_segments(sweep: f64, radius: f64, max_segment: f64) -> usize {
    let by_angle = (MIN_SEGMENTS_PER_TURN * sweep / TAU).ceil() as usize;
    segments_for(sweep * radius, max_segment)
        .max(by_angle)
        .clamp(2, MAX_SEGMENTS)
}

/// 与给定法向垂直的单位向量
fn any_perpendicular(normal: &Vector3) -> Vector3 {
    let n = normal.normalize();
    let reference = if n.z.abs() < 0.9 {
        Vector3::z()
    } else {
        Vector3::x()
    };
    let x = reference - n * n.dot(&reference);
    x.normalize()
}

/// 夹紧均匀节点向量
fn clamped_knots(degree: usize, pole_count: usize) -> Vec<f64> {
    let spans = pole_count - degree;
    let mut knots = vec![0.0; degree + 1];
    for i in 1..spans {
        knots.push(i as f64 / spans as f64);
    }
    knots.extend(std::iter::repeat(1.0).take(degree + 1));
    knots
}

fn sample_bspline(degree: usize, poles: &[Point3], knots: &[f64], max_segment: f64) -> Vec<Point3> {
    if degree == 0 || poles.len() < degree + 1 {
        return poles.to_vec();
    }
    let knots = if knots.len() == poles.len() + degree + 1 {
        knots.to_vec()
    } else {
        clamped_knots(degree, poles.len())
    };

    let start = knots[degree];
    let end = knots[poles.len()];
    let polygon: f64 = poles.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
    let n = segments_for(polygon, max_segment)
        .max(poles.len() * 4)
        .min(MAX_SEGMENTS);

    (0..=n)
        .map(|i| {
            let t = start + (end - start) * i as f64 / n as f64;
            de_boor(degree, &knots, poles, t)
        })
        .collect()
}

fn de_boor(degree: usize, knots: &[f64], poles: &[Point3], t: f64) -> Point3 {
    let n = poles.len();
    let mut k = degree;
    while k < n - 1 && t >= knots[k + 1] {
        k += 1;
    }

    let mut d: Vec<Vector3> = (0..=degree).map(|j| poles[j + k - degree].coords).collect();
    for r in 1..=degree {
        for j in (r..=degree).rev() {
            let i = j + k - degree;
            let denom = knots[i + degree + 1 - r] - knots[i];
            let alpha = if denom.abs() < EPSILON {
                0.0
            } else {
                (t - knots[i]) / denom
            };
            d[j] = d[j - 1] * (1.0 - alpha) + d[j] * alpha;
        }
    }
    Point3::from(d[degree])
}

/// 形状
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    /// 本层的边
    pub edges: Vec<Curve>,
    /// 本层的面数量
    pub face_count: usize,
    /// 子形状（复合体）
    pub children: Vec<Shape>,
}

impl Shape {
    /// 空形状
    pub fn null() -> Self {
        Self {
            kind: ShapeKind::Compound,
            edges: Vec::new(),
            face_count: 0,
            children: Vec::new(),
        }
    }

    pub fn edge(curve: Curve) -> Self {
        Self {
            kind: ShapeKind::Edge,
            edges: vec![curve],
            face_count: 0,
            children: Vec::new(),
        }
    }

    pub fn wire(edges: Vec<Curve>) -> Self {
        Self {
            kind: ShapeKind::Wire,
            edges,
            face_count: 0,
            children: Vec::new(),
        }
    }

    pub fn solid(edges: Vec<Curve>, face_count: usize) -> Self {
        Self {
            kind: ShapeKind::Solid,
            edges,
            face_count,
            children: Vec::new(),
        }
    }

    pub fn compound(children: Vec<Shape>) -> Self {
        Self {
            kind: ShapeKind::Compound,
            edges: Vec::new(),
            face_count: 0,
            children,
        }
    }

    /// 轴对齐长方体（12条边、6个面），用于测试和示例
    pub fn cuboid(x: f64, y: f64, z: f64) -> Self {
        let c = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(x, 0.0, 0.0),
            Point3::new(x, y, 0.0),
            Point3::new(0.0, y, 0.0),
        ];
        let top: Vec<Point3> = c.iter().map(|p| p + Vector3::new(0.0, 0.0, z)).collect();
        let mut edges = Vec::with_capacity(12);
        for i in 0..4 {
            let j = (i + 1) % 4;
            edges.push(Curve::line(c[i], c[j]));
            edges.push(Curve::line(top[i], top[j]));
            edges.push(Curve::line(c[i], top[i]));
        }
        Self::solid(edges, 6)
    }

    pub fn is_null(&self) -> bool {
        self.edges.is_empty() && self.face_count == 0 && self.children.iter().all(Shape::is_null)
    }

    /// 递归收集所有边
    pub fn all_edges(&self) -> Vec<&Curve> {
        let mut out: Vec<&Curve> = self.edges.iter().collect();
        for child in &self.children {
            out.extend(child.all_edges());
        }
        out
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len() + self.children.iter().map(Shape::edge_count).sum::<usize>()
    }

    pub fn face_total(&self) -> usize {
        self.face_count + self.children.iter().map(Shape::face_total).sum::<usize>()
    }

    /// 应用放置变换（递归）
    pub fn transformed(&self, placement: &Placement) -> Shape {
        Shape {
            kind: self.kind,
            edges: self.edges.iter().map(|c| c.transformed(placement)).collect(),
            face_count: self.face_count,
            children: self
                .children
                .iter()
                .map(|c| c.transformed(placement))
                .collect(),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox3 {
        BoundingBox3::from_points(
            self.all_edges()
                .into_iter()
                .flat_map(|c| c.sample(f64::INFINITY)),
        )
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::null()
    }
}

/// 弧度转角度，规范到 [0, 360)
pub fn normalized_degrees(angle: f64) -> f64 {
    (angle * 180.0 / PI).rem_euclid(360.0)
}
