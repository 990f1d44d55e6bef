//! 打印设备能力
//!
//! 宿主的打印配置是全局唯一的可变状态：同一时间只有一个激活的布局，
//! 因此所有设置方法都需要 `&mut self`，任务只能顺序执行。

use crate::error::DeviceError;
use sheetplot_core::math::Point2;
use std::path::Path;

/// 出图方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotRotation {
    /// 0°
    #[default]
    Portrait,
    /// 90°
    Landscape,
}

impl PlotRotation {
    /// 由图框宽高推断
    pub fn for_extents(width: f64, height: f64) -> Self {
        if width > height {
            PlotRotation::Landscape
        } else {
            PlotRotation::Portrait
        }
    }
}

/// 出图范围类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotType {
    Display,
    Extents,
    Limits,
    View,
    /// 指定窗口
    #[default]
    Window,
    Layout,
}

/// 一次出图运行的布局配置（构造时设置一次）
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// 打印设备名称
    pub device_name: String,
    /// 布满图纸
    pub scale_to_fit: bool,
    /// 居中打印
    pub center_plot: bool,
    pub plot_type: PlotType,
    /// 打印样式表
    pub style_sheet: String,
}

impl LayoutConfig {
    /// 窗口出图、布满、居中
    pub fn window_to_fit(device_name: impl Into<String>, style_sheet: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            scale_to_fit: true,
            center_plot: true,
            plot_type: PlotType::Window,
            style_sheet: style_sheet.into(),
        }
    }
}

/// 打印窗口（模型空间坐标，忽略Z）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotWindow {
    pub lower_left: Point2,
    pub upper_right: Point2,
}

impl PlotWindow {
    pub fn new(lower_left: Point2, upper_right: Point2) -> Self {
        Self {
            lower_left,
            upper_right,
        }
    }

    pub fn width(&self) -> f64 {
        (self.upper_right.x - self.lower_left.x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.upper_right.y - self.lower_left.y).abs()
    }
}

/// 打印设备
pub trait PlotDevice {
    /// 可用的打印设备名称
    fn device_names(&self) -> Result<Vec<String>, DeviceError>;

    /// 应用布局配置
    fn configure(&mut self, config: &LayoutConfig) -> Result<(), DeviceError>;

    /// 当前设备的纸张名称
    fn media_names(&self) -> Result<Vec<String>, DeviceError>;

    /// 纸张物理尺寸 (宽, 高)
    fn paper_size(&self, media: &str) -> Result<(f64, f64), DeviceError>;

    fn set_media(&mut self, media: &str) -> Result<(), DeviceError>;

    fn set_rotation(&mut self, rotation: PlotRotation) -> Result<(), DeviceError>;

    fn set_window(&mut self, window: &PlotWindow) -> Result<(), DeviceError>;

    /// 把当前布局输出到文件
    ///
    /// 返回时文件不一定已经写完，调用方需要自行等待。
    fn plot_to_file(&mut self, path: &Path) -> Result<(), DeviceError>;
}

impl<T: PlotDevice + ?Sized> PlotDevice for &mut T {
    fn device_names(&self) -> Result<Vec<String>, DeviceError> {
        (**self).device_names()
    }

    fn configure(&mut self, config: &LayoutConfig) -> Result<(), DeviceError> {
        (**self).configure(config)
    }

    fn media_names(&self) -> Result<Vec<String>, DeviceError> {
        (**self).media_names()
    }

    fn paper_size(&self, media: &str) -> Result<(f64, f64), DeviceError> {
        (**self).paper_size(media)
    }

    fn set_media(&mut self, media: &str) -> Result<(), DeviceError> {
        (**self).set_media(media)
    }

    fn set_rotation(&mut self, rotation: PlotRotation) -> Result<(), DeviceError> {
        (**self).set_rotation(rotation)
    }

    fn set_window(&mut self, window: &PlotWindow) -> Result<(), DeviceError> {
        (**self).set_window(window)
    }

    fn plot_to_file(&mut self, path: &Path) -> Result<(), DeviceError> {
        (**self).plot_to_file(path)
    }
}
