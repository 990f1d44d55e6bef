//! 程序配置
//!
//! 读取顺序：默认值 → `sheetplot.toml` → 环境变量 → 命令行参数。

use anyhow::{Context, Result};
use serde::Deserialize;
use sheetplot_file::DEFAULT_CACHE_FILE;
use sheetplot_plot::orchestrator::{DEFAULT_STYLE_SHEET, MEDIA_TOLERANCE};
use sheetplot_plot::{PlotSettings, WaitPolicy, DEFAULT_UNITS_PER_MM, PDF_DEVICE_NAME};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认配置文件名
pub const CONFIG_FILE: &str = "sheetplot.toml";

/// 程序配置
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detect: DetectConfig,
    pub plot: PlotConfig,
    pub logging: LoggingConfig,
}

/// 识别配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// 图框缓存文件
    pub cache_file: PathBuf,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
        }
    }
}

/// 出图配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub device: String,
    pub style_sheet: String,
    pub output_dir: PathBuf,
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
    pub media_tolerance: f64,
    /// 每毫米对应的图纸单位（默认100，图纸单位为 0.01mm）
    pub units_per_mm: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        let wait = WaitPolicy::default();
        Self {
            device: PDF_DEVICE_NAME.to_string(),
            style_sheet: DEFAULT_STYLE_SHEET.to_string(),
            output_dir: PathBuf::from("plots"),
            poll_interval_ms: wait.interval.as_millis() as u64,
            timeout_secs: wait.timeout.as_secs(),
            media_tolerance: MEDIA_TOLERANCE,
            units_per_mm: DEFAULT_UNITS_PER_MM,
        }
    }
}

impl PlotConfig {
    /// 转成出图参数
    pub fn settings(&self) -> PlotSettings {
        let mut settings = PlotSettings::new(self.device.clone(), self.output_dir.clone());
        settings.style_sheet = self.style_sheet.clone();
        settings.media_tolerance = self.media_tolerance;
        settings.wait = WaitPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        };
        settings
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error, off
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// 加载配置
    ///
    /// 显式指定的文件必须存在；未指定时当前目录下有 `sheetplot.toml` 就读取。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// 用环境变量覆盖
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(device) = var("SHEETPLOT_DEVICE") {
            self.plot.device = device;
        }
        if let Some(dir) = var("SHEETPLOT_OUTPUT_DIR") {
            self.plot.output_dir = PathBuf::from(dir);
        }
        if let Some(cache) = var("SHEETPLOT_CACHE") {
            self.detect.cache_file = PathBuf::from(cache);
        }
    }
}
