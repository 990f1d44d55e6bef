//! SheetPlot 出图编排
//!
//! 把选中的图框逐个送到打印设备：
//! - 按图框尺寸匹配设备纸张（容差10，正反两个方向）
//! - 宽大于高时横向出图
//! - 打印窗口取图框原始角点
//! - 轮询等待PDF文件出现（200ms间隔，30s超时）
//!
//! 设备通过 [`PlotDevice`] 注入；自带一个写PDF文件的虚拟设备 [`PdfPlotter`]。

pub mod device;
pub mod error;
pub mod job;
pub mod media;
pub mod orchestrator;
pub mod pdf_device;
pub mod pdf_page;
pub mod wait;

#[cfg(test)]
mod testing;

pub use device::{LayoutConfig, PlotDevice, PlotRotation, PlotType, PlotWindow};
pub use error::{DeviceError, JobFailure, PlotError};
pub use job::{JobOutcome, JobState, PlotJob};
pub use media::MediaCandidate;
pub use orchestrator::{output_file_name, PlotOrchestrator, PlotSettings, RunHooks, RunReport};
pub use pdf_device::{PdfPlotter, DEFAULT_UNITS_PER_MM, PDF_DEVICE_NAME};
pub use wait::{CancelToken, Clock, SystemClock, WaitPolicy};
