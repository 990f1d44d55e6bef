//! 数学类型
//!
//! 点类型直接复用 nalgebra，包围盒保留完整的三维角点。

use serde::{Deserialize, Serialize};

pub type Point2 = nalgebra::Point2<f64>;
pub type Point3 = nalgebra::Point3<f64>;

/// 平面线段（出图时使用的线条）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
}

impl Segment {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }
}

/// 三维轴对齐包围盒
///
/// 角点按宿主文档给出的原样保存，不做归一化。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox3 {
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// 从点集合构造（空集合返回 None）
    pub fn from_points(points: impl IntoIterator<Item = Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.expand(&p);
        }
        Some(bbox)
    }

    /// 扩展包围盒使其包含点
    pub fn expand(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// 合并另一个包围盒
    pub fn union(&self, other: &BoundingBox3) -> Self {
        let mut merged = *self;
        merged.expand(&other.min);
        merged.expand(&other.max);
        merged
    }

    /// X方向尺寸（绝对值）
    pub fn width(&self) -> f64 {
        (self.max.x - self.min.x).abs()
    }

    /// Y方向尺寸（绝对值）
    pub fn height(&self) -> f64 {
        (self.max.y - self.min.y).abs()
    }

    /// 点的XY投影是否在包围盒内（含边界）
    pub fn contains_xy(&self, p: &Point3) -> bool {
        self.min.x <= p.x && p.x <= self.max.x && self.min.y <= p.y && p.y <= self.max.y
    }

    /// 右下角（图签所在位置）
    pub fn bottom_right(&self) -> Point2 {
        Point2::new(self.max.x, self.min.y)
    }
}
