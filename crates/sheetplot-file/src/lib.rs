//! SheetPlot 文件处理
//!
//! 支持：
//! - `.dxf` 读取，作为图框识别的文档来源
//! - 图框缓存（JSON），在识别阶段和出图阶段之间保存结果

pub mod cache;
pub mod dxf_document;
pub mod error;

pub use cache::{FrameCache, CACHE_FORMAT_VERSION, DEFAULT_CACHE_FILE};
pub use dxf_document::DxfDocument;
pub use error::FileError;
