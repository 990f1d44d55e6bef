//! 出图错误定义

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 打印设备返回的错误
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Plot device unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown media: {0}")]
    UnknownMedia(String),

    #[error("Layout not ready: {0}")]
    NotConfigured(String),

    #[error("PDF error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 整个出图过程失败（只发生在构造阶段）
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(#[from] DeviceError),

    #[error("Output directory {}: {}", .path.display(), .source)]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// 单个图框的失败原因，不影响其他图框
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobFailure {
    #[error("format {width}x{height} not available on device")]
    MediaUnavailable { width: f64, height: f64 },

    #[error("timed out after {}s waiting for {}", .timeout.as_secs(), .path.display())]
    RenderTimeout { path: PathBuf, timeout: Duration },

    #[error("device error: {0}")]
    Device(String),

    #[error("cancelled")]
    Cancelled,
}

impl From<DeviceError> for JobFailure {
    fn from(err: DeviceError) -> Self {
        JobFailure::Device(err.to_string())
    }
}
