//! SheetPlot 核心：图框识别引擎
//!
//! 从CAD文档的实体中找出图框（块参照/外部参照），
//! 按 GOST 幅面分类，并在图框右下角附近查找图号。
//!
//! # 架构设计
//!
//! 宿主CAD文档通过 [`DocumentReader`](entity::DocumentReader) 注入：
//! - `EntityRecord`: 实体的只读快照（类型、包围盒、文字）
//! - `FrameAnalyzer`: 一次扫描，输出排好序的 `Frame` 列表
//! - `Frame`: 分类完成后不可变的图框记录
//!
//! # 示例
//!
//! ```rust
//! use sheetplot_core::prelude::*;
//!
//! let frame_ref = EntityRecord::block_reference(
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(42000.0, 29700.0, 0.0),
//! );
//! let entities = vec![frame_ref];
//!
//! let frames = FrameAnalyzer::new(&entities).detect().unwrap();
//! assert_eq!(frames[0].format_label(), "A3");
//! ```

pub mod analyzer;
pub mod entity;
pub mod error;
pub mod format;
pub mod frame;
pub mod math;
pub mod sheet_number;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::analyzer::{DetectionReport, FrameAnalyzer};
    pub use crate::entity::{DocumentReader, EntityKind, EntityRecord};
    pub use crate::error::{AnalyzeError, DocumentError};
    pub use crate::format::{classify, format_label};
    pub use crate::frame::{Frame, UNKNOWN_SHEET_NUMBER};
    pub use crate::math::{BoundingBox3, Point2, Point3, Segment};
}
