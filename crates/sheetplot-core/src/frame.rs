//! 图框记录
//!
//! 分类完成后的图框不可变：宽高与角点在创建时一次性确定，
//! 之后只允许在排序时重新编号。

use crate::math::{BoundingBox3, Point3};
use serde::{Deserialize, Serialize};

/// 找不到图号时的占位值
pub const UNKNOWN_SHEET_NUMBER: &str = "???";

/// 已分类的图框
///
/// 序列化字段名与图框缓存文件保持一致（`sheet`、`format`、`w`、`h`、`min`、`max`）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// 排序后的序号，从1开始
    #[serde(rename = "sheet")]
    sheet_index: u32,
    /// 图签中的图号
    sheet_number: String,
    /// 幅面标签，例如 "A3"、"A4×3"、"A2 верт."
    #[serde(rename = "format")]
    format_label: String,
    /// 包围盒X方向尺寸（取整）
    #[serde(rename = "w")]
    width: f64,
    /// 包围盒Y方向尺寸（取整）
    #[serde(rename = "h")]
    height: f64,
    /// 原始包围盒最小角点
    #[serde(rename = "min")]
    min_corner: Point3,
    /// 原始包围盒最大角点
    #[serde(rename = "max")]
    max_corner: Point3,
}

/// 尺寸取整（与原始数据保持一致，0.5 向偶数取整）
pub(crate) fn round_extent(value: f64) -> f64 {
    value.abs().round_ties_even()
}

impl Frame {
    /// 由包围盒创建图框，宽高从角点计算
    pub fn new(
        sheet_index: u32,
        sheet_number: impl Into<String>,
        format_label: impl Into<String>,
        bounds: BoundingBox3,
    ) -> Self {
        Self {
            sheet_index,
            sheet_number: sheet_number.into(),
            format_label: format_label.into(),
            width: round_extent(bounds.max.x - bounds.min.x),
            height: round_extent(bounds.max.y - bounds.min.y),
            min_corner: bounds.min,
            max_corner: bounds.max,
        }
    }

    pub fn sheet_index(&self) -> u32 {
        self.sheet_index
    }

    pub fn sheet_number(&self) -> &str {
        &self.sheet_number
    }

    /// 是否找到了图号
    pub fn has_sheet_number(&self) -> bool {
        self.sheet_number != UNKNOWN_SHEET_NUMBER
    }

    pub fn format_label(&self) -> &str {
        &self.format_label
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn min_corner(&self) -> Point3 {
        self.min_corner
    }

    pub fn max_corner(&self) -> Point3 {
        self.max_corner
    }

    /// 原始包围盒
    pub fn bounds(&self) -> BoundingBox3 {
        BoundingBox3::new(self.min_corner, self.max_corner)
    }

    /// 宽大于高
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// 列表显示用的一行文字
    pub fn display_line(&self) -> String {
        format!(
            "{:<4} | Лист {:<8} | {:<10} | {:.0}x{:.0}",
            self.sheet_index, self.sheet_number, self.format_label, self.width, self.height
        )
    }

    /// 重新编号（仅排序时使用）
    pub(crate) fn renumbered(mut self, sheet_index: u32) -> Self {
        self.sheet_index = sheet_index;
        self
    }
}
