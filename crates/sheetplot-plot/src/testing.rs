//! 测试用的设备和时钟

use crate::device::{LayoutConfig, PlotDevice, PlotRotation, PlotWindow};
use crate::error::DeviceError;
use crate::wait::Clock;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// 手动推进的时钟；可以安排文件在某个时刻出现
pub struct ManualClock {
    base: Instant,
    offset: Cell<Duration>,
    scheduled: RefCell<Vec<(Duration, PathBuf)>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Cell::new(Duration::ZERO),
            scheduled: RefCell::new(Vec::new()),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    /// 在 `at` 时刻创建文件
    pub fn create_file_at(&self, at: Duration, path: &Path) {
        self.scheduled.borrow_mut().push((at, path.to_path_buf()));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }

    fn sleep(&self, duration: Duration) {
        let now = self.offset.get() + duration;
        self.offset.set(now);
        self.scheduled.borrow_mut().retain(|(at, path)| {
            if *at <= now {
                std::fs::write(path, b"%PDF-1.4").unwrap();
                false
            } else {
                true
            }
        });
    }
}

/// 一次提交时的布局状态
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub path: PathBuf,
    pub media: Option<String>,
    pub rotation: PlotRotation,
    pub window: Option<PlotWindow>,
}

/// 记录所有调用的假设备
#[derive(Default)]
pub struct FakeDevice {
    pub devices: Vec<String>,
    pub media: Vec<(String, f64, f64)>,
    pub unreadable_media: Vec<String>,
    /// 输出时不写文件的文件名
    pub silent_outputs: Vec<String>,
    /// 输出时报错的文件名
    pub rejected_outputs: Vec<String>,
    pub unreachable: bool,
    pub configured: Vec<LayoutConfig>,
    pub submissions: Vec<Submission>,
    current_media: Option<String>,
    rotation: PlotRotation,
    window: Option<PlotWindow>,
    size_queries: Cell<usize>,
}

impl FakeDevice {
    pub fn with_media(media: &[(&str, f64, f64)]) -> Self {
        Self {
            devices: vec!["DWG To PDF.pc3".to_string()],
            media: media
                .iter()
                .map(|(name, w, h)| (name.to_string(), *w, *h))
                .collect(),
            ..Default::default()
        }
    }

    pub fn size_queries(&self) -> usize {
        self.size_queries.get()
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl PlotDevice for FakeDevice {
    fn device_names(&self) -> Result<Vec<String>, DeviceError> {
        if self.unreachable {
            return Err(DeviceError::Unavailable("host not running".into()));
        }
        Ok(self.devices.clone())
    }

    fn configure(&mut self, config: &LayoutConfig) -> Result<(), DeviceError> {
        if self.unreachable || !self.devices.contains(&config.device_name) {
            return Err(DeviceError::Unavailable(config.device_name.clone()));
        }
        self.configured.push(config.clone());
        Ok(())
    }

    fn media_names(&self) -> Result<Vec<String>, DeviceError> {
        Ok(self.media.iter().map(|(name, _, _)| name.clone()).collect())
    }

    fn paper_size(&self, media: &str) -> Result<(f64, f64), DeviceError> {
        self.size_queries.set(self.size_queries.get() + 1);
        if self.unreadable_media.iter().any(|m| m == media) {
            return Err(DeviceError::UnknownMedia(media.to_string()));
        }
        self.media
            .iter()
            .find(|(name, _, _)| name == media)
            .map(|(_, w, h)| (*w, *h))
            .ok_or_else(|| DeviceError::UnknownMedia(media.to_string()))
    }

    fn set_media(&mut self, media: &str) -> Result<(), DeviceError> {
        self.current_media = Some(media.to_string());
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
        let name = Self::file_name(path);
        if self.rejected_outputs.contains(&name) {
            return Err(DeviceError::NotConfigured("plot rejected".into()));
        }

        self.submissions.push(Submission {
            path: path.to_path_buf(),
            media: self.current_media.clone(),
            rotation: self.rotation,
            window: self.window,
        });

        if !self.silent_outputs.contains(&name) {
            std::fs::write(path, b"%PDF-1.4")?;
        }
        Ok(())
    }
}
