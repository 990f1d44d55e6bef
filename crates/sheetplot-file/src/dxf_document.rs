//! DXF 文档读取
//!
//! 把 DXF 图纸转换为图框识别需要的实体快照：
//! - `INSERT` → 块参照（块带外部参照路径时为外部参照），包围盒由块定义变换得到
//! - `TEXT` / `MTEXT` → 文字实体（插入点 + 原始内容）
//! - 其他实体 → 保留类名和包围盒
//!
//! 同时提供模型空间的线条（块参照展开后），供出图设备绘制。

use crate::error::FileError;
use nalgebra::Matrix3;
use sheetplot_core::entity::{DocumentReader, EntityKind, EntityRecord};
use sheetplot_core::error::DocumentError;
use sheetplot_core::math::{BoundingBox3, Point2, Point3, Segment};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};

/// 块嵌套最大深度
const MAX_BLOCK_DEPTH: usize = 8;

/// 整圆离散的段数
const CIRCLE_SEGMENTS: usize = 32;

/// DXF 文档
pub struct DxfDocument {
    drawing: dxf::Drawing,
    path: Option<PathBuf>,
}

/// 块参照的放置变换（平面仿射 + Z 偏移）
#[derive(Debug, Clone, Copy)]
struct Placement {
    matrix: Matrix3<f64>,
    z_offset: f64,
}

impl Placement {
    fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
            z_offset: 0.0,
        }
    }

    /// INSERT 的变换：先减块基点，再缩放、旋转、平移到插入点
    fn for_insert(insert: &dxf::entities::Insert, base_point: &dxf::Point) -> Self {
        let (sin, cos) = insert.rotation.to_radians().sin_cos();
        let sx = insert.x_scale_factor;
        let sy = insert.y_scale_factor;

        let to_base = Matrix3::new(
            1.0, 0.0, -base_point.x,
            0.0, 1.0, -base_point.y,
            0.0, 0.0, 1.0,
        );
        let scale_rotate_move = Matrix3::new(
            cos * sx, -sin * sy, insert.location.x,
            sin * sx, cos * sy, insert.location.y,
            0.0, 0.0, 1.0,
        );

        Self {
            matrix: scale_rotate_move * to_base,
            z_offset: insert.location.z - base_point.z,
        }
    }

    /// 组合：先应用 inner，再应用 self
    fn then_inner(&self, inner: &Placement) -> Self {
        Self {
            matrix: self.matrix * inner.matrix,
            z_offset: self.z_offset + inner.z_offset,
        }
    }

    fn apply(&self, x: f64, y: f64, z: f64) -> Point3 {
        let v = self.matrix * nalgebra::Vector3::new(x, y, 1.0);
        Point3::new(v.x, v.y, z + self.z_offset)
    }

    fn apply_point(&self, p: &dxf::Point) -> Point3 {
        self.apply(p.x, p.y, p.z)
    }
}

/// 收集到的几何
#[derive(Debug, Default)]
struct GeometrySink {
    segments: Vec<(Point3, Point3)>,
    points: Vec<Point3>,
}

impl GeometrySink {
    fn polyline(&mut self, points: &[Point3], closed: bool) {
        for pair in points.windows(2) {
            self.segments.push((pair[0], pair[1]));
        }
        if closed && points.len() > 2 {
            self.segments.push((points[points.len() - 1], points[0]));
        }
        if points.len() == 1 {
            self.points.push(points[0]);
        }
    }

    fn bounds(&self) -> Option<BoundingBox3> {
        BoundingBox3::from_points(
            self.segments
                .iter()
                .flat_map(|(a, b)| [*a, *b])
                .chain(self.points.iter().copied()),
        )
    }
}

impl DxfDocument {
    /// 从DXF文件加载
    pub fn open(path: &Path) -> Result<Self, FileError> {
        let drawing = dxf::Drawing::load_file(path).map_err(|e| FileError::Dxf(e.to_string()))?;

        tracing::info!("Opened drawing {}", path.display());

        Ok(Self {
            drawing,
            path: Some(path.to_path_buf()),
        })
    }

    /// 包装内存中的图纸
    pub fn from_drawing(drawing: dxf::Drawing) -> Self {
        Self { drawing, path: None }
    }

    /// 文件路径
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 块名（大写）→ 块定义
    fn block_table(&self) -> HashMap<String, &dxf::Block> {
        self.drawing
            .blocks()
            .map(|block| (block.name.to_uppercase(), block))
            .collect()
    }

    /// 模型空间的顶层实体（图纸空间实体不参与识别和出图）
    fn model_space_entities(&self) -> impl Iterator<Item = &dxf::entities::Entity> + '_ {
        self.drawing
            .entities()
            .filter(|entity| !entity.common.is_in_paper_space)
    }

    /// 模型空间线条（块参照展开，文字不绘制）
    pub fn segments(&self) -> Vec<Segment> {
        let blocks = self.block_table();
        let mut sink = GeometrySink::default();

        for entity in self.model_space_entities() {
            collect_geometry(entity, &blocks, &Placement::identity(), 0, &mut sink);
        }

        sink.segments
            .into_iter()
            .map(|(a, b)| Segment::new(Point2::new(a.x, a.y), Point2::new(b.x, b.y)))
            .collect()
    }

    /// 单个顶层实体的快照
    fn record(&self, entity: &dxf::entities::Entity, blocks: &HashMap<String, &dxf::Block>) -> EntityRecord {
        use dxf::entities::EntityType;

        match &entity.specific {
            EntityType::Insert(insert) => {
                let block = blocks.get(&insert.name.to_uppercase());
                let kind = match block {
                    Some(b) if !b.xref_path_name.is_empty() => EntityKind::ExternalReference,
                    _ => EntityKind::BlockReference,
                };
                let mut record = EntityRecord::new(kind);
                record.insertion_point = Some(Placement::identity().apply_point(&insert.location));
                record.bounds = geometry_bounds(entity, blocks);
                record
            }
            EntityType::Text(text) => {
                EntityRecord::text(Placement::identity().apply_point(&text.location), text.value.clone())
            }
            EntityType::MText(mtext) => EntityRecord::mtext(
                Placement::identity().apply_point(&mtext.insertion_point),
                mtext.text.clone(),
            ),
            other => {
                let mut record = EntityRecord::new(EntityKind::Other(class_name(other).to_string()));
                record.bounds = geometry_bounds(entity, blocks);
                record
            }
        }
    }
}

impl DocumentReader for DxfDocument {
    fn entities(&self) -> Result<Vec<EntityRecord>, DocumentError> {
        let blocks = self.block_table();
        let records: Vec<_> = self
            .model_space_entities()
            .map(|entity| self.record(entity, &blocks))
            .collect();

        tracing::debug!("Enumerated {} entities", records.len());

        Ok(records)
    }
}

/// 实体（含展开后的块内容）的包围盒
fn geometry_bounds(
    entity: &dxf::entities::Entity,
    blocks: &HashMap<String, &dxf::Block>,
) -> Option<BoundingBox3> {
    let mut sink = GeometrySink::default();
    collect_geometry(entity, blocks, &Placement::identity(), 0, &mut sink);
    sink.bounds()
}

/// 把实体离散为线段和孤立点
fn collect_geometry(
    entity: &dxf::entities::Entity,
    blocks: &HashMap<String, &dxf::Block>,
    placement: &Placement,
    depth: usize,
    sink: &mut GeometrySink,
) {
    use dxf::entities::EntityType;

    match &entity.specific {
        EntityType::Line(line) => {
            sink.segments
                .push((placement.apply_point(&line.p1), placement.apply_point(&line.p2)));
        }

        EntityType::Circle(circle) => {
            let points = arc_points(&circle.center, circle.radius, 0.0, TAU, CIRCLE_SEGMENTS, placement);
            sink.polyline(&points, false);
        }

        EntityType::Arc(arc) => {
            let start = arc.start_angle.to_radians();
            let mut sweep = arc.end_angle.to_radians() - start;
            if sweep <= 0.0 {
                sweep += TAU;
            }
            let steps = ((sweep / TAU) * CIRCLE_SEGMENTS as f64).ceil().max(1.0) as usize;
            let points = arc_points(&arc.center, arc.radius, start, sweep, steps, placement);
            sink.polyline(&points, false);
        }

        EntityType::LwPolyline(lwpoly) => {
            let vertices: Vec<(f64, f64, f64)> =
                lwpoly.vertices.iter().map(|v| (v.x, v.y, v.bulge)).collect();
            let points = bulge_path(&vertices, lwpoly.is_closed(), lwpoly.elevation, placement);
            sink.polyline(&points, false);
        }

        EntityType::Polyline(poly) => {
            let vertices: Vec<(f64, f64, f64)> = poly
                .vertices()
                .map(|v| (v.location.x, v.location.y, v.bulge))
                .collect();
            let elevation = poly.vertices().next().map(|v| v.location.z).unwrap_or(0.0);
            let points = bulge_path(&vertices, poly.is_closed(), elevation, placement);
            sink.polyline(&points, false);
        }

        EntityType::ModelPoint(point) => {
            sink.points.push(placement.apply_point(&point.location));
        }

        EntityType::Text(text) => {
            sink.points.push(placement.apply_point(&text.location));
        }

        EntityType::MText(mtext) => {
            sink.points.push(placement.apply_point(&mtext.insertion_point));
        }

        EntityType::Insert(insert) => {
            if depth >= MAX_BLOCK_DEPTH {
                tracing::debug!("Block nesting too deep at {}", insert.name);
                return;
            }
            let Some(block) = blocks.get(&insert.name.to_uppercase()) else {
                tracing::debug!("Missing block definition {}", insert.name);
                return;
            };

            let inner = Placement::for_insert(insert, &block.base_point);
            let combined = placement.then_inner(&inner);
            for child in &block.entities {
                collect_geometry(child, blocks, &combined, depth + 1, sink);
            }
        }

        _ => {}
    }
}

/// 圆弧采样点（逆时针）
fn arc_points(
    center: &dxf::Point,
    radius: f64,
    start: f64,
    sweep: f64,
    steps: usize,
    placement: &Placement,
) -> Vec<Point3> {
    (0..=steps)
        .map(|i| {
            let angle = start + sweep * i as f64 / steps as f64;
            placement.apply(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
                center.z,
            )
        })
        .collect()
}

/// 带凸度的多段线路径
///
/// 凸度 b = tan(θ/4)，正值为逆时针弧。
fn bulge_path(vertices: &[(f64, f64, f64)], closed: bool, z: f64, placement: &Placement) -> Vec<Point3> {
    let mut points = Vec::new();
    let count = vertices.len();
    if count == 0 {
        return points;
    }

    let segment_count = if closed { count } else { count - 1 };
    points.push(placement.apply(vertices[0].0, vertices[0].1, z));

    for i in 0..segment_count {
        let (x1, y1, bulge) = vertices[i];
        let (x2, y2, _) = vertices[(i + 1) % count];

        if bulge.abs() > 1e-9 {
            let (dx, dy) = (x2 - x1, y2 - y1);
            let chord = (dx * dx + dy * dy).sqrt();
            if chord > 1e-12 {
                let theta = 4.0 * bulge.atan();
                // 圆心在弦的左法线方向
                let offset = (1.0 - bulge * bulge) / (4.0 * bulge);
                let cx = (x1 + x2) / 2.0 - dy * offset;
                let cy = (y1 + y2) / 2.0 + dx * offset;
                let radius = ((x1 - cx).powi(2) + (y1 - cy).powi(2)).sqrt();
                let start = (y1 - cy).atan2(x1 - cx);
                let steps = ((theta.abs() / TAU) * CIRCLE_SEGMENTS as f64).ceil().max(1.0) as usize;

                for s in 1..steps {
                    let angle = start + theta * s as f64 / steps as f64;
                    points.push(placement.apply(cx + radius * angle.cos(), cy + radius * angle.sin(), z));
                }
            }
        }

        points.push(placement.apply(x2, y2, z));
    }

    points
}

/// 宿主风格的实体类名
fn class_name(specific: &dxf::entities::EntityType) -> &'static str {
    use dxf::entities::EntityType;

    match specific {
        EntityType::Line(_) => "AcDbLine",
        EntityType::Circle(_) => "AcDbCircle",
        EntityType::Arc(_) => "AcDbArc",
        EntityType::LwPolyline(_) => "AcDbPolyline",
        EntityType::Polyline(_) => "AcDb2dPolyline",
        EntityType::ModelPoint(_) => "AcDbPoint",
        EntityType::Insert(_) => "AcDbBlockReference",
        EntityType::Text(_) => "AcDbText",
        EntityType::MText(_) => "AcDbMText",
        _ => "AcDbEntity",
    }
}
