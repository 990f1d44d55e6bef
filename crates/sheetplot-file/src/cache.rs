//! 图框缓存文件
//!
//! 识别结果以 JSON 保存，出图阶段再读回来：
//! - 当前格式带版本号的外层结构 `{ format_version, created_at, source, frames }`
//! - 兼容旧格式：顶层直接是图框数组

use crate::error::FileError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetplot_core::frame::Frame;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// 默认缓存文件名
pub const DEFAULT_CACHE_FILE: &str = "frames_data.json";

/// 当前缓存格式版本
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// 图框缓存内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCache {
    /// 格式版本
    pub format_version: u32,
    /// 识别时间（旧格式没有）
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// 来源图纸路径
    #[serde(default)]
    pub source: Option<String>,
    /// 排好序的图框
    pub frames: Vec<Frame>,
}

/// 磁盘上可能出现的两种布局
#[derive(Deserialize)]
#[serde(untagged)]
enum CacheLayout {
    Versioned(FrameCache),
    Legacy(Vec<Frame>),
}

impl FrameCache {
    /// 以当前时间创建
    pub fn new(frames: Vec<Frame>, source: Option<String>) -> Self {
        Self {
            format_version: CACHE_FORMAT_VERSION,
            created_at: Some(Utc::now()),
            source,
            frames,
        }
    }

    /// 保存到文件（先写临时文件再改名，避免留下半截文件）
    pub fn save(&self, path: &Path) -> Result<(), FileError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, path)?;

        tracing::info!("Saved {} frames to {}", self.frames.len(), path.display());

        Ok(())
    }

    /// 从文件加载
    pub fn load(path: &Path) -> Result<Self, FileError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let layout: CacheLayout = serde_json::from_reader(reader)?;
        let cache = match layout {
            CacheLayout::Versioned(cache) => cache,
            CacheLayout::Legacy(frames) => Self {
                format_version: 0,
                created_at: None,
                source: None,
                frames,
            },
        };

        if cache.format_version > CACHE_FORMAT_VERSION {
            return Err(FileError::UnsupportedVersion(format!(
                "Cache version {} is newer than supported version {}",
                cache.format_version, CACHE_FORMAT_VERSION
            )));
        }

        tracing::info!("Loaded {} frames from {}", cache.frames.len(), path.display());

        Ok(cache)
    }

    /// 按序号查找图框
    pub fn frame(&self, sheet_index: u32) -> Option<&Frame> {
        self.frames.iter().find(|f| f.sheet_index() == sheet_index)
    }
}
