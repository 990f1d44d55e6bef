//! 纸张匹配
//!
//! 逐个枚举设备纸张，直接方向或交换方向的两边误差都小于容差即命中。
//! 取第一个命中的纸张，不再继续比较。

use crate::device::PlotDevice;
use crate::error::DeviceError;

/// 设备纸张
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCandidate {
    pub name: String,
    pub width: f64,
    pub height: f64,
}

impl MediaCandidate {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// 尺寸是否匹配（任一方向，误差严格小于容差）
    pub fn fits(&self, width: f64, height: f64, tolerance: f64) -> bool {
        let direct = (self.width - width).abs() < tolerance && (self.height - height).abs() < tolerance;
        let swapped = (self.height - width).abs() < tolerance && (self.width - height).abs() < tolerance;
        direct || swapped
    }
}

/// 在设备上查找第一个匹配的纸张
///
/// 枚举纸张失败视为设备错误；单个纸张取不到尺寸时跳过。
pub fn find_media<D: PlotDevice + ?Sized>(
    device: &D,
    width: f64,
    height: f64,
    tolerance: f64,
) -> Result<Option<MediaCandidate>, DeviceError> {
    for name in device.media_names()? {
        let (paper_w, paper_h) = match device.paper_size(&name) {
            Ok(size) => size,
            Err(e) => {
                tracing::debug!("Skipping media {}: {}", name, e);
                continue;
            }
        };

        let candidate = MediaCandidate::new(name, paper_w, paper_h);
        if candidate.fits(width, height, tolerance) {
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}
