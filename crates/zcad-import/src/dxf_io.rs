//! DXF文件导入/导出
//!
//! 读取：把模型空间（可选图纸空间）中的 LINE、CIRCLE、ARC、LWPOLYLINE、
//! POLYLINE、ELLIPSE、SPLINE 实体转换为零件特征，图层写入文档图层表。
//!
//! 写出：把形状的每条边写为对应的 DXF 实体。R12 不支持的曲线类型
//! （椭圆、样条）以及强制多段线模式下的曲线会按最大段长离散为多段线。

use crate::args::{DxfReadRequest, DxfWriteRequest};
use crate::error::{DxfError, ImportError};
use crate::params::{ParamGroup, ParameterManager};
use crate::settings::{DXF_READ_SOURCE, DXF_WRITE_SOURCE};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use zcad_core::document::Document;
use zcad_core::layer::Layer;
use zcad_core::math::{Point3, Vector3, EPSILON};
use zcad_core::object::ObjectKind;
use zcad_core::properties::{Appearance, Color};
use zcad_core::shape::{normalized_degrees, Curve, Shape};
use zcad_core::Application;

/// DXF 读取选项
#[derive(Debug, Clone, PartialEq)]
pub struct DxfReadOptions {
    /// 坐标缩放系数
    pub scaling: f64,
    pub import_paper_space: bool,
    /// 使用实体原始颜色
    pub original_colors: bool,
    /// 按图层分组
    pub group_layers: bool,
}

impl Default for DxfReadOptions {
    fn default() -> Self {
        Self {
            scaling: 1.0,
            import_paper_space: false,
            original_colors: true,
            group_layers: false,
        }
    }
}

impl DxfReadOptions {
    pub fn from_group(group: &ParamGroup) -> Self {
        let defaults = Self::default();
        Self {
            scaling: group.get_float("dxfScaling", defaults.scaling),
            import_paper_space: group.get_bool("dxfImportPaperSpace", defaults.import_paper_space),
            original_colors: group.get_bool("dxfGetOriginalColors", defaults.original_colors),
            group_layers: group.get_bool("dxfGroupLayers", defaults.group_layers),
        }
    }
}

/// 读取统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DxfReadReport {
    pub imported: usize,
    /// 不支持的实体类型
    pub skipped_unsupported: usize,
    /// 退化或损坏的实体
    pub skipped_malformed: usize,
}

/// DXF读取器
pub struct DxfReader {
    path: PathBuf,
    options: DxfReadOptions,
}

impl DxfReader {
    pub fn new(path: impl Into<PathBuf>, options: DxfReadOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// 读取到文档；`ignore_errors` 为 false 时遇到损坏实体立即失败
    pub fn read(&self, doc: &mut Document, ignore_errors: bool) -> Result<DxfReadReport, DxfError> {
        let drawing = load_drawing(&self.path)?;
        let mut report = DxfReadReport::default();

        // 导入图层
        for layer in drawing.layers() {
            let color = aci_to_color(layer.color.index().unwrap_or(7));
            doc.layers.add_layer(Layer::new(layer.name.as_str()).with_color(color));
        }

        // 图层名 → 分组对象名
        let mut groups: BTreeMap<String, String> = BTreeMap::new();
        for entity in drawing.entities() {
            if entity.common.is_in_paper_space && !self.options.import_paper_space {
                continue;
            }

            let Some((kind, edges)) = convert_dxf_entity(entity, self.options.scaling) else {
                report.skipped_unsupported += 1;
                tracing::debug!("skipping unsupported DXF entity");
                continue;
            };

            if let Some(reason) = edges.iter().find_map(Curve::degeneracy) {
                let err = DxfError::Malformed {
                    kind: kind.to_string(),
                    reason,
                };
                if !ignore_errors {
                    return Err(err);
                }
                tracing::warn!("{}", err);
                report.skipped_malformed += 1;
                continue;
            }

            let shape = match <[Curve; 1]>::try_from(edges) {
                Ok([curve]) => Shape::edge(curve),
                Err(edges) => Shape::wire(edges),
            };

            let layer_name = entity.common.layer.clone();
            let appearance = self.entity_appearance(doc, entity);
            let object = doc.add_object(kind_label(kind), ObjectKind::Feature { shape });
            object.appearance = appearance;
            let name = object.name.clone();

            if self.options.group_layers {
                let group = groups.entry(layer_name).or_insert_with_key(|layer| {
                    doc.add_object(layer, ObjectKind::Group { children: Vec::new() })
                        .name
                        .clone()
                });
                if let Err(e) = doc.add_child(group, &name) {
                    tracing::warn!("{}", e);
                }
            }
            report.imported += 1;
        }

        tracing::info!(
            "read {} entities from {} ({} unsupported, {} malformed)",
            report.imported,
            self.path.display(),
            report.skipped_unsupported,
            report.skipped_malformed
        );
        Ok(report)
    }

    fn entity_appearance(&self, doc: &Document, entity: &dxf::entities::Entity) -> Appearance {
        if !self.options.original_colors {
            return Appearance::default();
        }
        let color = entity.common.color.index().map(aci_to_color).or_else(|| {
            doc.layers
                .get_layer(&entity.common.layer)
                .map(|layer| layer.color)
        });
        match color {
            Some(color) => Appearance::with_color(color),
            None => Appearance::default(),
        }
    }
}

fn kind_label(kind: &str) -> &'static str {
    match kind {
        "LINE" => "Line",
        "CIRCLE" => "Circle",
        "ARC" => "Arc",
        "ELLIPSE" => "Ellipse",
        "SPLINE" => "BSpline",
        _ => "Wire",
    }
}

/// 将DXF实体转换为曲线，不支持的实体返回 None
fn convert_dxf_entity(
    entity: &dxf::entities::Entity,
    scale: f64,
) -> Option<(&'static str, Vec<Curve>)> {
    let p = |pt: &dxf::Point| Point3::new(pt.x * scale, pt.y * scale, pt.z * scale);

    let converted = match &entity.specific {
        dxf::entities::EntityType::Line(line) => ("LINE", vec![Curve::line(p(&line.p1), p(&line.p2))]),

        dxf::entities::EntityType::Circle(circle) => (
            "CIRCLE",
            vec![Curve::Circle {
                center: p(&circle.center),
                normal: to_vector(&circle.normal),
                radius: circle.radius * scale,
            }],
        ),

        dxf::entities::EntityType::Arc(arc) => (
            "ARC",
            vec![Curve::Arc {
                center: p(&arc.center),
                normal: to_vector(&arc.normal),
                x_axis: Vector3::x(),
                radius: arc.radius * scale,
                start_angle: arc.start_angle.to_radians(),
                end_angle: arc.end_angle.to_radians(),
            }],
        ),

        dxf::entities::EntityType::LwPolyline(lwpoly) => {
            let vertices: Vec<(Point3, f64)> = lwpoly
                .vertices
                .iter()
                .map(|v| (Point3::new(v.x * scale, v.y * scale, 0.0), v.bulge))
                .collect();
            ("LWPOLYLINE", polyline_edges(&vertices, lwpoly.is_closed()))
        }

        dxf::entities::EntityType::Polyline(poly) => {
            let vertices: Vec<(Point3, f64)> =
                poly.vertices().map(|v| (p(&v.location), v.bulge)).collect();
            ("POLYLINE", polyline_edges(&vertices, poly.is_closed()))
        }

        dxf::entities::EntityType::Ellipse(ellipse) => (
            "ELLIPSE",
            vec![Curve::Ellipse {
                center: p(&ellipse.center),
                normal: to_vector(&ellipse.normal),
                major_axis: to_vector(&ellipse.major_axis) * scale,
                ratio: ellipse.minor_axis_ratio,
                start_param: ellipse.start_parameter,
                end_param: ellipse.end_parameter,
            }],
        ),

        dxf::entities::EntityType::Spline(spline) => {
            let curve = if spline.control_points.is_empty() {
                // 只有拟合点时按折线处理
                Curve::Polyline {
                    points: spline.fit_points.iter().map(p).collect(),
                    closed: spline.is_closed(),
                }
            } else {
                Curve::BSpline {
                    degree: spline.degree_of_curve.max(0) as u32,
                    poles: spline.control_points.iter().map(p).collect(),
                    knots: spline.knot_values.clone(),
                    closed: spline.is_closed(),
                }
            };
            ("SPLINE", vec![curve])
        }

        _ => return None,
    };
    Some(converted)
}

fn to_vector(v: &dxf::Vector) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

/// 多段线顶点（带凸度）转换为直线段和圆弧段
fn polyline_edges(vertices: &[(Point3, f64)], closed: bool) -> Vec<Curve> {
    if vertices.len() < 2 {
        return vec![Curve::Polyline {
            points: vertices.iter().map(|(pt, _)| *pt).collect(),
            closed,
        }];
    }
    if vertices.iter().all(|(_, bulge)| bulge.abs() < EPSILON) {
        return vec![Curve::Polyline {
            points: vertices.iter().map(|(pt, _)| *pt).collect(),
            closed,
        }];
    }

    let count = if closed {
        vertices.len()
    } else {
        vertices.len() - 1
    };
    (0..count)
        .map(|i| {
            let (start, bulge) = vertices[i];
            let (end, _) = vertices[(i + 1) % vertices.len()];
            bulge_segment(start, end, bulge)
        })
        .collect()
}

/// 凸度 b = tan(θ/4)，b > 0 时从起点逆时针到终点
fn bulge_segment(start: Point3, end: Point3, bulge: f64) -> Curve {
    let chord = end - start;
    let length = chord.norm();
    if bulge.abs() < EPSILON || length < EPSILON {
        return Curve::line(start, end);
    }

    let direction = chord / length;
    let left = Vector3::new(-direction.y, direction.x, 0.0);
    let offset = length / 2.0 * (1.0 - bulge * bulge) / (2.0 * bulge);
    let center = start + chord / 2.0 + left * offset;
    let radius = length * (1.0 + bulge * bulge) / (4.0 * bulge.abs());

    let angle = |pt: &Point3| (pt.y - center.y).atan2(pt.x - center.x);
    let (start_angle, end_angle) = if bulge > 0.0 {
        (angle(&start), angle(&end))
    } else {
        (angle(&end), angle(&start))
    };
    Curve::arc(center, radius, start_angle, end_angle)
}

/// DXF 输出版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DxfVersion {
    R12,
    R14,
}

impl DxfVersion {
    /// 12 → R12，其他值 → R14
    pub fn from_number(version: i64) -> Self {
        if version == 12 {
            DxfVersion::R12
        } else {
            DxfVersion::R14
        }
    }

    fn acad(&self) -> dxf::enums::AcadVersion {
        match self {
            DxfVersion::R12 => dxf::enums::AcadVersion::R12,
            DxfVersion::R14 => dxf::enums::AcadVersion::R14,
        }
    }
}

/// DXF 写出选项
#[derive(Debug, Clone, PartialEq)]
pub struct DxfWriteOptions {
    pub version: DxfVersion,
    /// 离散化时的最大段长
    pub max_segment_length: f64,
    /// 椭圆总是离散为多段线
    pub discretize_ellipses: bool,
}

impl Default for DxfWriteOptions {
    fn default() -> Self {
        Self {
            version: DxfVersion::R14,
            max_segment_length: 5.0,
            discretize_ellipses: false,
        }
    }
}

impl DxfWriteOptions {
    pub fn from_group(group: &ParamGroup) -> Self {
        let defaults = Self::default();
        let max_segment_length = group.get_float("MaxSegmentLength", defaults.max_segment_length);
        Self {
            version: DxfVersion::from_number(group.get_int("DxfVersionOut", 14)),
            max_segment_length: if max_segment_length > 0.0 {
                max_segment_length
            } else {
                defaults.max_segment_length
            },
            discretize_ellipses: group.get_bool("DiscretizeEllipses", defaults.discretize_ellipses),
        }
    }
}

/// DXF写出器
///
/// 使用顺序：`set_*` 配置 → `init` → 多次 `export_shape` → `end_run`。
pub struct DxfWriter {
    path: PathBuf,
    options: DxfWriteOptions,
    poly_override: bool,
    layer_name: String,
    layer_color: Option<Color>,
    drawing: dxf::Drawing,
    layers: BTreeSet<String>,
    entity_count: usize,
}

impl DxfWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: DxfWriteOptions::default(),
            poly_override: false,
            layer_name: "0".to_string(),
            layer_color: None,
            drawing: dxf::Drawing::new(),
            layers: BTreeSet::new(),
            entity_count: 0,
        }
    }

    pub fn set_options(&mut self, options: DxfWriteOptions) {
        self.options = options;
    }

    /// 覆盖输出版本，仅接受 12 和 14
    pub fn set_version(&mut self, version: u32) {
        match version {
            12 => self.options.version = DxfVersion::R12,
            14 => self.options.version = DxfVersion::R14,
            other => tracing::warn!("ignoring unsupported DXF version {}", other),
        }
    }

    pub fn set_poly_override(&mut self, poly_override: bool) {
        self.poly_override = poly_override;
    }

    pub fn set_layer_name(&mut self, name: &str) {
        self.layer_name = name.to_string();
    }

    pub fn set_layer_color(&mut self, color: Option<Color>) {
        self.layer_color = color;
    }

    pub fn version(&self) -> DxfVersion {
        self.options.version
    }

    /// 开始新的输出
    pub fn init(&mut self) {
        self.drawing = dxf::Drawing::new();
        self.drawing.header.version = self.options.version.acad();
        self.layers.clear();
        self.entity_count = 0;
    }

    /// 写出形状的全部边
    pub fn export_shape(&mut self, shape: &Shape) {
        self.ensure_layer();
        for curve in shape.all_edges() {
            self.export_curve(curve);
        }
    }

    /// 保存文件，返回写出的实体数
    pub fn end_run(&mut self) -> Result<usize, DxfError> {
        self.drawing
            .save_file(&self.path)
            .map_err(|e| DxfError::Write(e.to_string()))?;
        tracing::info!(
            "wrote {} entities to {} ({:?})",
            self.entity_count,
            self.path.display(),
            self.options.version
        );
        Ok(self.entity_count)
    }

    fn ensure_layer(&mut self) {
        if self.layer_name == "0" || !self.layers.insert(self.layer_name.clone()) {
            return;
        }
        let mut dxf_layer = dxf::tables::Layer::default();
        dxf_layer.name = self.layer_name.clone();
        dxf_layer.color = dxf::Color::from_index(self.layer_color.map_or(7, |c| color_to_aci(&c)));
        self.drawing.add_layer(dxf_layer);
    }

    fn export_curve(&mut self, curve: &Curve) {
        let r12 = self.options.version == DxfVersion::R12;
        let planar = curve.is_planar_xy();

        match curve {
            Curve::Line { start, end } => {
                let mut dxf_line = dxf::entities::Line::default();
                dxf_line.p1 = to_dxf_point(start);
                dxf_line.p2 = to_dxf_point(end);
                self.add(dxf::entities::EntityType::Line(dxf_line));
            }

            Curve::Circle { center, radius, .. } if planar && !self.poly_override => {
                let mut dxf_circle = dxf::entities::Circle::default();
                dxf_circle.center = to_dxf_point(center);
                dxf_circle.radius = *radius;
                self.add(dxf::entities::EntityType::Circle(dxf_circle));
            }

            Curve::Arc {
                center,
                x_axis,
                radius,
                start_angle,
                end_angle,
                ..
            } if planar && !self.poly_override => {
                let offset = x_axis.y.atan2(x_axis.x);
                let mut dxf_arc = dxf::entities::Arc::default();
                dxf_arc.center = to_dxf_point(center);
                dxf_arc.radius = *radius;
                dxf_arc.start_angle = normalized_degrees(start_angle + offset);
                dxf_arc.end_angle = normalized_degrees(end_angle + offset);
                self.add(dxf::entities::EntityType::Arc(dxf_arc));
            }

            Curve::Ellipse {
                center,
                major_axis,
                ratio,
                start_param,
                end_param,
                ..
            } if planar && !r12 && !self.poly_override && !self.options.discretize_ellipses => {
                let mut dxf_ellipse = dxf::entities::Ellipse::default();
                dxf_ellipse.center = to_dxf_point(center);
                dxf_ellipse.major_axis = dxf::Vector::new(major_axis.x, major_axis.y, major_axis.z);
                dxf_ellipse.minor_axis_ratio = *ratio;
                dxf_ellipse.start_parameter = *start_param;
                dxf_ellipse.end_parameter = *end_param;
                self.add(dxf::entities::EntityType::Ellipse(dxf_ellipse));
            }

            Curve::BSpline {
                degree,
                poles,
                knots,
                closed,
            } if planar && !r12 && !self.poly_override => {
                let mut dxf_spline = dxf::entities::Spline::default();
                dxf_spline.degree_of_curve = *degree as i32;
                dxf_spline.control_points = poles.iter().map(to_dxf_point).collect();
                dxf_spline.knot_values = knots.clone();
                if *closed {
                    dxf_spline.flags |= 1;
                }
                self.add(dxf::entities::EntityType::Spline(dxf_spline));
            }

            Curve::Polyline { points, closed } => self.add_polyline(points, *closed),

            other => {
                let points = other.sample(self.options.max_segment_length);
                self.add_polyline(&points, other.is_closed());
            }
        }
    }

    fn add_polyline(&mut self, points: &[Point3], closed: bool) {
        let flat = points.iter().all(|p| p.z.abs() < EPSILON);
        if self.options.version == DxfVersion::R12 || !flat {
            let mut poly = dxf::entities::Polyline::default();
            poly.set_is_closed(closed);
            for point in points {
                poly.add_vertex(
                    &mut self.drawing,
                    dxf::entities::Vertex::new(to_dxf_point(point)),
                );
            }
            self.add(dxf::entities::EntityType::Polyline(poly));
        } else {
            let mut lwpoly = dxf::entities::LwPolyline::default();
            lwpoly.set_is_closed(closed);
            lwpoly.vertices = points
                .iter()
                .map(|p| {
                    let mut vertex = dxf::LwPolylineVertex::default();
                    vertex.x = p.x;
                    vertex.y = p.y;
                    vertex
                })
                .collect();
            self.add(dxf::entities::EntityType::LwPolyline(lwpoly));
        }
    }

    fn add(&mut self, specific: dxf::entities::EntityType) {
        let mut entity = dxf::entities::Entity::new(specific);
        entity.common.layer = self.layer_name.clone();
        self.drawing.add_entity(entity);
        self.entity_count += 1;
    }
}

fn to_dxf_point(p: &Point3) -> dxf::Point {
    dxf::Point::new(p.x, p.y, p.z)
}

/// AutoCAD颜色索引(ACI)转颜色
pub fn aci_to_color(aci: u8) -> Color {
    match aci {
        1 => Color::RED,
        2 => Color::YELLOW,
        3 => Color::GREEN,
        4 => Color::CYAN,
        5 => Color::BLUE,
        6 => Color::MAGENTA,
        7 => Color::WHITE,
        8 => Color::GRAY,
        _ => Color::WHITE,
    }
}

/// 颜色转最接近的AutoCAD颜色索引
pub fn color_to_aci(color: &Color) -> u8 {
    let distance = |c: Color| {
        let dr = color.r as i32 - c.r as i32;
        let dg = color.g as i32 - c.g as i32;
        let db = color.b as i32 - c.b as i32;
        dr * dr + dg * dg + db * db
    };
    (1..=8u8)
        .min_by_key(|aci| distance(aci_to_color(*aci)))
        .unwrap_or(7)
}

/// `readDXF`：读取 DXF 文件到文档并重算
///
/// 文档选择：指定名称的文档，否则活动文档，都不存在时新建（使用指定名称）。
pub fn read_dxf(
    app: &mut Application,
    params: &ParameterManager,
    request: &DxfReadRequest,
) -> Result<DxfReadReport, ImportError> {
    if !request.path.exists() {
        return Err(DxfError::FileNotFound.into());
    }
    let source = request.option_source.as_deref().unwrap_or(DXF_READ_SOURCE);
    let options = DxfReadOptions::from_group(params.group_by_path(source)?);

    let existing = match request.document.as_deref() {
        Some(name) => app.get_document(name).map(|d| d.name().to_string()),
        None => app.active_document_name().map(str::to_string),
    };
    let document = match existing {
        Some(name) => name,
        None => app
            .new_document(request.document.as_deref())
            .name()
            .to_string(),
    };

    let doc = app
        .get_document_mut(&document)
        .ok_or_else(|| zcad_core::DocumentError::DocumentNotFound(document.clone()))?;
    let report = DxfReader::new(request.path.clone(), options).read(doc, request.ignore_errors)?;
    app.recompute(&document)?;
    Ok(report)
}

fn configured_writer(
    params: &ParameterManager,
    request: &DxfWriteRequest,
) -> Result<DxfWriter, ImportError> {
    let source = request.option_source.as_deref().unwrap_or(DXF_WRITE_SOURCE);
    let mut writer = DxfWriter::new(request.path.clone());
    writer.set_options(DxfWriteOptions::from_group(params.group_by_path(source)?));
    if let Some(version) = request.version {
        writer.set_version(version);
    }
    writer.set_poly_override(request.poly_override);
    writer.set_layer_name("none");
    writer.init();
    Ok(writer)
}

/// `writeDXFShape`：写出形状，图层名为 `none`
pub fn write_dxf_shapes(
    params: &ParameterManager,
    request: &DxfWriteRequest,
) -> Result<usize, ImportError> {
    let mut writer = configured_writer(params, request)?;
    for entity in &request.entities {
        if let Value::Shape(shape) = entity {
            writer.export_shape(shape);
        }
    }
    Ok(writer.end_run()?)
}

/// `writeDXFObject`：写出零件特征，每个对象使用以其内部名称命名的图层
pub fn write_dxf_objects(
    app: &Application,
    params: &ParameterManager,
    request: &DxfWriteRequest,
) -> Result<usize, ImportError> {
    let mut writer = configured_writer(params, request)?;
    for reference in request.entities.iter().filter_map(Value::as_object) {
        let Some(object) = app.resolve(reference) else {
            tracing::debug!("skipping unresolved object {}", reference);
            continue;
        };
        let Some(shape) = object.shape() else {
            tracing::warn!("'{}' is not a part feature, skipped", object.name);
            continue;
        };
        writer.set_layer_name(&object.name);
        writer.set_layer_color(object.appearance.shape_color);
        writer.export_shape(&shape.transformed(&object.placement));
    }
    Ok(writer.end_run()?)
}

/// 加载 DXF 图纸
pub fn load_drawing(path: &Path) -> Result<dxf::Drawing, DxfError> {
    dxf::Drawing::load_file(path).map_err(|e| DxfError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::IMPORT_GROUP;
    use zcad_core::object::ObjectRef;
    use std::f64::consts::PI;

    fn write_request(path: &Path, entities: Vec<Value>) -> DxfWriteRequest {
        DxfWriteRequest {
            entities,
            path: path.to_path_buf(),
            version: None,
            poly_override: false,
            option_source: None,
        }
    }

    fn entity_kinds(path: &Path) -> Vec<String> {
        load_drawing(path)
            .unwrap()
            .entities()
            .map(|e| match &e.specific {
                dxf::entities::EntityType::Line(_) => "LINE",
                dxf::entities::EntityType::Circle(_) => "CIRCLE",
                dxf::entities::EntityType::Arc(_) => "ARC",
                dxf::entities::EntityType::Ellipse(_) => "ELLIPSE",
                dxf::entities::EntityType::Spline(_) => "SPLINE",
                dxf::entities::EntityType::LwPolyline(_) => "LWPOLYLINE",
                dxf::entities::EntityType::Polyline(_) => "POLYLINE",
                _ => "OTHER",
            })
            .map(str::to_string)
            .collect()
    }

    fn profile() -> Shape {
        Shape::wire(vec![
            Curve::line(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)),
            Curve::arc(Point3::new(10.0, 5.0, 0.0), 5.0, -PI / 2.0, PI / 2.0),
            Curve::Ellipse {
                center: Point3::new(0.0, 5.0, 0.0),
                normal: Vector3::z(),
                major_axis: Vector3::new(3.0, 0.0, 0.0),
                ratio: 0.5,
                start_param: 0.0,
                end_param: 2.0 * PI,
            },
        ])
    }

    #[test]
    fn test_write_r14_native_entities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.dxf");
        let params = ParameterManager::new();

        let count =
            write_dxf_shapes(&params, &write_request(&path, vec![Value::Shape(profile())])).unwrap();
        assert_eq!(count, 3);
        assert_eq!(entity_kinds(&path), vec!["LINE", "ARC", "ELLIPSE"]);

        let drawing = load_drawing(&path).unwrap();
        assert_eq!(drawing.header.version, dxf::enums::AcadVersion::R14);
        let arc = drawing
            .entities()
            .find_map(|e| match &e.specific {
                dxf::entities::EntityType::Arc(arc) => Some(arc.clone()),
                _ => None,
            })
            .unwrap();
        assert!((arc.start_angle - 270.0).abs() < 1e-9);
        assert!((arc.end_angle - 90.0).abs() < 1e-9);
        assert!(drawing.entities().all(|e| e.common.layer == "none"));
    }

    #[test]
    fn test_version_override() {
        let dir = tempfile::tempdir().unwrap();
        let params = ParameterManager::new();

        let r12 = dir.path().join("r12.dxf");
        let mut request = write_request(&r12, vec![Value::Shape(profile())]);
        request.version = Some(12);
        write_dxf_shapes(&params, &request).unwrap();
        assert_eq!(
            load_drawing(&r12).unwrap().header.version,
            dxf::enums::AcadVersion::R12
        );
        assert_eq!(entity_kinds(&r12), vec!["LINE", "ARC", "POLYLINE"]);

        let mut writer = DxfWriter::new(dir.path().join("r13.dxf"));
        writer.set_version(13);
        assert_eq!(writer.version(), DxfVersion::R14);
    }

    #[test]
    fn test_poly_override_discretises_curves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poly.dxf");
        let mut request = write_request(&path, vec![Value::Shape(profile())]);
        request.poly_override = true;
        write_dxf_shapes(&ParameterManager::new(), &request).unwrap();
        assert_eq!(entity_kinds(&path), vec!["LINE", "LWPOLYLINE", "LWPOLYLINE"]);
    }

    #[test]
    fn test_write_options_from_preferences() {
        let mut params = ParameterManager::new();
        let group = params.user_group_mut(IMPORT_GROUP);
        group.set_int("DxfVersionOut", 12);
        group.set_float("MaxSegmentLength", 0.5);
        group.set_bool("DiscretizeEllipses", true);

        let options =
            DxfWriteOptions::from_group(params.group_by_path(DXF_WRITE_SOURCE).unwrap());
        assert_eq!(options.version, DxfVersion::R12);
        assert_eq!(options.max_segment_length, 0.5);
        assert!(options.discretize_ellipses);
        assert_eq!(DxfWriteOptions::from_group(&ParamGroup::new()), DxfWriteOptions::default());
    }

    #[test]
    fn test_write_objects_uses_object_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.dxf");
        let mut app = Application::new();
        let doc = app.new_document(Some("Doc"));
        let feature = doc.add_object(
            "Edge",
            ObjectKind::Feature {
                shape: Shape::edge(Curve::circle(Point3::origin(), 2.0)),
            },
        );
        feature.appearance.shape_color = Some(Color::RED);
        doc.add_object("Asm", ObjectKind::Group { children: vec![] });

        let request = write_request(
            &path,
            vec![
                Value::Object(ObjectRef::new("Doc", "Edge")),
                Value::Object(ObjectRef::new("Doc", "Asm")),
                Value::Object(ObjectRef::new("Doc", "Missing")),
            ],
        );
        let count = write_dxf_objects(&app, &ParameterManager::new(), &request).unwrap();
        assert_eq!(count, 1);

        let drawing = load_drawing(&path).unwrap();
        assert!(drawing.entities().all(|e| e.common.layer == "Edge"));
        let layer = drawing.layers().find(|l| l.name == "Edge").unwrap();
        assert_eq!(layer.color.index(), Some(1));
    }

    #[test]
    fn test_read_roundtrip_and_document_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.dxf");
        let params = ParameterManager::new();
        write_dxf_shapes(&params, &write_request(&path, vec![Value::Shape(profile())])).unwrap();

        let mut app = Application::new();
        let request = DxfReadRequest {
            path: path.clone(),
            document: Some("Drawing".into()),
            ignore_errors: true,
            option_source: None,
        };
        let report = read_dxf(&mut app, &params, &request).unwrap();
        assert_eq!(report.imported, 3);
        let doc = app.get_document("Drawing").unwrap();
        assert_eq!(doc.object_count(), 3);
        assert!(doc.object("Ellipse").is_some());
        assert!(doc.layers.get_layer("none").is_some());
        assert_eq!(doc.recompute_count(), 1);

        // 未指定文档时读入活动文档
        let request = DxfReadRequest {
            document: None,
            ..request
        };
        read_dxf(&mut app, &params, &request).unwrap();
        assert_eq!(app.document_count(), 1);
        assert_eq!(app.get_document("Drawing").unwrap().object_count(), 6);
    }

    #[test]
    fn test_read_missing_file() {
        let mut app = Application::new();
        let request = DxfReadRequest {
            path: PathBuf::from("/nonexistent/drawing.dxf"),
            document: None,
            ignore_errors: true,
            option_source: None,
        };
        let err = read_dxf(&mut app, &ParameterManager::new(), &request).unwrap_err();
        assert_eq!(err.to_string(), "File doesn't exist");
        assert_eq!(app.document_count(), 0);
    }

    #[test]
    fn test_read_malformed_entities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.dxf");
        let mut drawing = dxf::Drawing::new();
        let mut good = dxf::entities::Circle::default();
        good.radius = 1.0;
        drawing.add_entity(dxf::entities::Entity::new(
            dxf::entities::EntityType::Circle(good),
        ));
        drawing.add_entity(dxf::entities::Entity::new(
            dxf::entities::EntityType::Circle(dxf::entities::Circle::default()),
        ));
        drawing.save_file(&path).unwrap();

        let mut doc = Document::new("Doc");
        let reader = DxfReader::new(path.clone(), DxfReadOptions::default());
        let report = reader.read(&mut doc, true).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped_malformed, 1);

        let mut strict = Document::new("Strict");
        let err = reader.read(&mut strict, false).unwrap_err();
        assert!(matches!(err, DxfError::Malformed { .. }));
    }

    fn line_entity(layer: &str, from: (f64, f64), to: (f64, f64)) -> dxf::entities::Entity {
        let mut entity = dxf::entities::Entity::new(dxf::entities::EntityType::Line(
            dxf::entities::Line::new(
                dxf::Point::new(from.0, from.1, 0.0),
                dxf::Point::new(to.0, to.1, 0.0),
            ),
        ));
        entity.common.layer = layer.to_string();
        entity
    }

    fn save_entities(path: &Path, entities: Vec<dxf::entities::Entity>) {
        let mut drawing = dxf::Drawing::new();
        for entity in entities {
            drawing.add_entity(entity);
        }
        drawing.save_file(path).unwrap();
    }

    #[test]
    fn test_read_options_from_preferences() {
        assert_eq!(
            DxfReadOptions::from_group(&ParamGroup::new()),
            DxfReadOptions::default()
        );

        let mut group = ParamGroup::new();
        group.set_float("dxfScaling", 25.4);
        group.set_bool("dxfImportPaperSpace", true);
        group.set_bool("dxfGetOriginalColors", false);
        group.set_bool("dxfGroupLayers", true);
        assert_eq!(
            DxfReadOptions::from_group(&group),
            DxfReadOptions {
                scaling: 25.4,
                import_paper_space: true,
                original_colors: false,
                group_layers: true,
            }
        );
    }

    #[test]
    fn test_read_paper_space() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.dxf");
        let mut title = line_entity("0", (0.0, 0.0), (1.0, 0.0));
        title.common.is_in_paper_space = true;
        save_entities(&path, vec![title, line_entity("0", (0.0, 1.0), (1.0, 1.0))]);

        // 默认只读模型空间
        let mut doc = Document::new("Model");
        let report = DxfReader::new(path.clone(), DxfReadOptions::default())
            .read(&mut doc, true)
            .unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(doc.object_count(), 1);

        let options = DxfReadOptions {
            import_paper_space: true,
            ..DxfReadOptions::default()
        };
        let mut doc = Document::new("Sheet");
        let report = DxfReader::new(path, options).read(&mut doc, true).unwrap();
        assert_eq!(report.imported, 2);
    }

    #[test]
    fn test_read_group_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.dxf");
        save_entities(
            &path,
            vec![
                line_entity("A", (0.0, 0.0), (1.0, 0.0)),
                line_entity("B", (0.0, 1.0), (1.0, 1.0)),
                line_entity("A", (0.0, 2.0), (1.0, 2.0)),
            ],
        );

        let mut params = ParameterManager::new();
        params
            .group_by_path_mut(DXF_READ_SOURCE)
            .unwrap()
            .set_bool("dxfGroupLayers", true);
        let mut app = Application::new();
        let request = DxfReadRequest {
            path: path.clone(),
            document: Some("Drawing".into()),
            ignore_errors: true,
            option_source: None,
        };
        let report = read_dxf(&mut app, &params, &request).unwrap();
        assert_eq!(report.imported, 3);

        let doc = app.get_document("Drawing").unwrap();
        assert_eq!(doc.object_count(), 5);
        let children = |group: &str| -> Vec<String> {
            let group = doc.object(group).unwrap();
            assert!(matches!(group.kind, ObjectKind::Group { .. }));
            group
                .children()
                .iter()
                .map(|id| doc.object_by_id(*id).unwrap().name.clone())
                .collect()
        };
        assert_eq!(children("A"), vec!["Line", "Line002"]);
        assert_eq!(children("B"), vec!["Line001"]);
        assert_eq!(doc.root_objects().count(), 2);

        // 未开启时不创建分组
        let mut doc = Document::new("Flat");
        DxfReader::new(path, DxfReadOptions::default())
            .read(&mut doc, true)
            .unwrap();
        assert_eq!(doc.object_count(), 3);
        assert!(doc.objects().all(|o| o.is_part_feature()));
    }

    #[test]
    fn test_read_scaling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaled.dxf");
        save_entities(&path, vec![line_entity("0", (1.0, 0.0), (2.0, 0.0))]);

        let options = DxfReadOptions {
            scaling: 2.0,
            ..DxfReadOptions::default()
        };
        let mut doc = Document::new("Doc");
        DxfReader::new(path, options).read(&mut doc, true).unwrap();
        let shape = doc.object("Line").unwrap().shape().unwrap();
        let edges = shape.all_edges();
        let Curve::Line { start, end } = edges[0] else {
            panic!("expected line");
        };
        assert!(zcad_core::math::points_near(start, &Point3::new(2.0, 0.0, 0.0), 1e-9));
        assert!(zcad_core::math::points_near(end, &Point3::new(4.0, 0.0, 0.0), 1e-9));
    }

    #[test]
    fn test_read_original_colors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colors.dxf");
        let mut red = line_entity("0", (0.0, 0.0), (1.0, 0.0));
        red.common.color = dxf::Color::from_index(1);
        save_entities(&path, vec![red]);

        let mut doc = Document::new("Colored");
        DxfReader::new(path.clone(), DxfReadOptions::default())
            .read(&mut doc, true)
            .unwrap();
        assert_eq!(doc.object("Line").unwrap().appearance.shape_color, Some(Color::RED));

        let options = DxfReadOptions {
            original_colors: false,
            ..DxfReadOptions::default()
        };
        let mut doc = Document::new("Plain");
        DxfReader::new(path, options).read(&mut doc, true).unwrap();
        assert_eq!(doc.object("Line").unwrap().appearance, Appearance::default());
    }

    #[test]
    fn test_bulge_segments() {
        let edges = polyline_edges(
            &[
                (Point3::new(0.0, 0.0, 0.0), 1.0),
                (Point3::new(2.0, 0.0, 0.0), 0.0),
            ],
            false,
        );
        assert_eq!(edges.len(), 1);
        let pts = edges[0].sample(0.1);
        assert!(zcad_core::math::points_near(&pts[0], &Point3::new(0.0, 0.0, 0.0), 1e-9));
        assert!(zcad_core::math::points_near(
            pts.last().unwrap(),
            &Point3::new(2.0, 0.0, 0.0),
            1e-9
        ));
        // 凸度 1 为半圆，逆时针经过弦的右侧
        assert!(pts.iter().any(|p| (p.y + 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_aci_mapping() {
        assert_eq!(color_to_aci(&Color::RED), 1);
        assert_eq!(color_to_aci(&Color::new(250, 10, 5)), 1);
        assert_eq!(aci_to_color(5), Color::BLUE);
        assert_eq!(aci_to_color(200), Color::WHITE);
    }
}
