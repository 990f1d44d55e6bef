//! 虚拟PDF打印设备
//!
//! 把模型空间线段按打印窗口输出为单页PDF，行为上模拟 "DWG To PDF.pc3"：
//! 纸张目录包含 ISO A4–A0 和 GOST 2.301 加长幅面，单色描边。
//!
//! 纸张尺寸以毫米登记，对外报告时乘以 `units_per_mm`（默认100，图纸单位为 0.01mm），
//! 使其与图纸单位下的图框尺寸可直接比较。

use crate::device::{LayoutConfig, PlotDevice, PlotRotation, PlotWindow};
use crate::error::DeviceError;
use crate::pdf_page::{mm_to_pt, single_page, PageContent};
use sheetplot_core::math::Segment;
use std::path::Path;
use tracing::debug;

/// 设备名称
pub const PDF_DEVICE_NAME: &str = "DWG To PDF.pc3";

/// 默认每毫米的图纸单位
pub const DEFAULT_UNITS_PER_MM: f64 = 100.0;

/// 线宽 (pt)
const LINE_WIDTH: f64 = 0.5;

/// 纸张目录：(幅面, 短边mm, 长边mm)
const MEDIA_CATALOG: &[(&str, f64, f64)] = &[
    ("A4", 210.0, 297.0),
    ("A3", 297.0, 420.0),
    ("A2", 420.0, 594.0),
    ("A1", 594.0, 841.0),
    ("A0", 841.0, 1189.0),
    // GOST 加长幅面
    ("A4x3", 297.0, 630.0),
    ("A4x4", 297.0, 841.0),
    ("A4x5", 297.0, 1051.0),
    ("A4x6", 297.0, 1261.0),
    ("A4x7", 297.0, 1471.0),
    ("A4x8", 297.0, 1682.0),
    ("A4x9", 297.0, 1892.0),
    ("A3x3", 420.0, 891.0),
    ("A3x4", 420.0, 1189.0),
    ("A3x5", 420.0, 1486.0),
    ("A3x6", 420.0, 1783.0),
    ("A3x7", 420.0, 2080.0),
    ("A2x3", 594.0, 1261.0),
    ("A2x4", 594.0, 1682.0),
    ("A2x5", 594.0, 2102.0),
    ("A1x3", 841.0, 1783.0),
    ("A1x4", 841.0, 2378.0),
    ("A0x2", 1189.0, 1682.0),
    ("A0x3", 1189.0, 2523.0),
];

/// 纸张的规范名称，例如 `ISO_full_bleed_A3_(297.00_x_420.00_MM)`
fn canonical_media_name(label: &str, width: f64, height: f64) -> String {
    format!("ISO_full_bleed_{}_({:.2}_x_{:.2}_MM)", label, width, height)
}

/// 写PDF文件的打印设备
pub struct PdfPlotter {
    segments: Vec<Segment>,
    units_per_mm: f64,
    layout: Option<LayoutConfig>,
    media: Option<(f64, f64)>,
    rotation: PlotRotation,
    window: Option<PlotWindow>,
}

impl PdfPlotter {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            units_per_mm: DEFAULT_UNITS_PER_MM,
            layout: None,
            media: None,
            rotation: PlotRotation::Portrait,
            window: None,
        }
    }

    /// 每毫米对应的图纸单位
    pub fn with_units_per_mm(mut self, units_per_mm: f64) -> Self {
        if units_per_mm > 0.0 {
            self.units_per_mm = units_per_mm;
        }
        self
    }

    fn lookup(media: &str) -> Option<(f64, f64)> {
        MEDIA_CATALOG
            .iter()
            .find(|(label, w, h)| canonical_media_name(label, *w, *h) == media)
            .map(|(_, w, h)| (*w, *h))
    }

    fn require_layout(&self) -> Result<&LayoutConfig, DeviceError> {
        self.layout
            .as_ref()
            .ok_or_else(|| DeviceError::NotConfigured("device not configured".into()))
    }

    /// 生成页面内容，返回 (页宽pt, 页高pt, 内容)
    fn render(&self) -> Result<(f64, f64, PageContent), DeviceError> {
        let layout = self.require_layout()?;
        let (short, long) = self
            .media
            .ok_or_else(|| DeviceError::NotConfigured("no media selected".into()))?;
        let window = self
            .window
            .ok_or_else(|| DeviceError::NotConfigured("no plot window".into()))?;
        if window.width() <= 0.0 || window.height() <= 0.0 {
            return Err(DeviceError::NotConfigured("empty plot window".into()));
        }

        let (page_w, page_h) = match self.rotation {
            PlotRotation::Landscape => (mm_to_pt(long), mm_to_pt(short)),
            PlotRotation::Portrait => (mm_to_pt(short), mm_to_pt(long)),
        };

        let scale = if layout.scale_to_fit {
            (page_w / window.width()).min(page_h / window.height())
        } else {
            mm_to_pt(1.0) / self.units_per_mm
        };

        let drawn_w = window.width() * scale;
        let drawn_h = window.height() * scale;
        let (offset_x, offset_y) = if layout.center_plot {
            ((page_w - drawn_w) / 2.0, (page_h - drawn_h) / 2.0)
        } else {
            (0.0, 0.0)
        };

        let min_x = window.lower_left.x.min(window.upper_right.x);
        let min_y = window.lower_left.y.min(window.upper_right.y);
        let max_x = window.lower_left.x.max(window.upper_right.x);
        let max_y = window.lower_left.y.max(window.upper_right.y);
        let to_page = |x: f64, y: f64| (offset_x + (x - min_x) * scale, offset_y + (y - min_y) * scale);

        let mut content = PageContent::new();
        content.save_state();
        content.clip_rect(offset_x, offset_y, drawn_w, drawn_h);
        content.stroke_gray(0.0);
        content.line_width(LINE_WIDTH);

        let mut drawn = 0usize;
        for segment in &self.segments {
            let (a, b) = (segment.start, segment.end);
            if a.x.max(b.x) < min_x || a.x.min(b.x) > max_x || a.y.max(b.y) < min_y || a.y.min(b.y) > max_y {
                continue;
            }
            let (x1, y1) = to_page(a.x, a.y);
            let (x2, y2) = to_page(b.x, b.y);
            content.line(x1, y1, x2, y2);
            drawn += 1;
        }
        content.restore_state();

        debug!("Rendered {} of {} segments", drawn, self.segments.len());
        Ok((page_w, page_h, content))
    }
}

impl PlotDevice for PdfPlotter {
    fn device_names(&self) -> Result<Vec<String>, DeviceError> {
        Ok(vec![PDF_DEVICE_NAME.to_string()])
    }

    fn configure(&mut self, config: &LayoutConfig) -> Result<(), DeviceError> {
        if config.device_name != PDF_DEVICE_NAME {
            return Err(DeviceError::Unavailable(config.device_name.clone()));
        }
        self.layout = Some(config.clone());
        Ok(())
    }

    fn media_names(&self) -> Result<Vec<String>, DeviceError> {
        self.require_layout()?;
        Ok(MEDIA_CATALOG
            .iter()
            .map(|(label, w, h)| canonical_media_name(label, *w, *h))
            .collect())
    }

    fn paper_size(&self, media: &str) -> Result<(f64, f64), DeviceError> {
        let (w, h) = Self::lookup(media).ok_or_else(|| DeviceError::UnknownMedia(media.to_string()))?;
        Ok((w * self.units_per_mm, h * self.units_per_mm))
    }

    fn set_media(&mut self, media: &str) -> Result<(), DeviceError> {
        let size = Self::lookup(media).ok_or_else(|| DeviceError::UnknownMedia(media.to_string()))?;
        self.media = Some(size);
        Ok(())
    }

    fn set_rotation(&mut self, rotation: PlotRotation) -> Result<(), DeviceError> {
        self.rotation = rotation;
        Ok(())
    }

    fn set_window(&mut self, window: &PlotWindow) -> Result<(), DeviceError> {
        self.window = Some(*window);
        Ok(())
    }

    fn plot_to_file(&mut self, path: &Path) -> Result<(), DeviceError> {
        let (page_w, page_h, content) = self.render()?;
        let bytes =
            single_page(page_w, page_h, &content).map_err(|e| DeviceError::Render(e.to_string()))?;

        // 先写临时文件再改名，轮询方不会看到写了一半的文件
        let partial = path.with_extension("pdf.part");
        std::fs::write(&partial, bytes)?;
        std::fs::rename(&partial, path)?;
        Ok(())
    }
}
