//! 图框选择
//!
//! 语法：逗号分隔的序号和闭区间，例如 `1,3-5`。

use anyhow::{bail, Context, Result};
use sheetplot_core::frame::Frame;
use std::collections::BTreeSet;

/// 解析序号列表
///
/// 区间终点不能超过 `last_index`（缓存中最大的序号）。
pub fn parse_sheets(spec: &str, last_index: u32) -> Result<BTreeSet<u32>> {
    let mut indices = BTreeSet::new();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_index(start)?;
                let end = parse_index(end)?;
                if start > end {
                    bail!("invalid range {}", part);
                }
                if end > last_index {
                    bail!("range {} is past the last sheet {}", part, last_index);
                }
                indices.extend(start..=end);
            }
            None => {
                indices.insert(parse_index(part)?);
            }
        }
    }

    if indices.is_empty() {
        bail!("no sheets selected");
    }
    Ok(indices)
}

fn parse_index(text: &str) -> Result<u32> {
    text.trim()
        .parse()
        .with_context(|| format!("invalid sheet index '{}'", text.trim()))
}

/// 从缓存中取出选中的图框，保持缓存顺序
///
/// 不存在的序号直接报错，不做部分出图。
pub fn select_frames(frames: &[Frame], indices: &BTreeSet<u32>) -> Result<Vec<Frame>> {
    let missing: Vec<String> = indices
        .iter()
        .filter(|idx| !frames.iter().any(|f| f.sheet_index() == **idx))
        .map(u32::to_string)
        .collect();
    if !missing.is_empty() {
        bail!("unknown sheet index: {}", missing.join(", "));
    }

    Ok(frames
        .iter()
        .filter(|f| indices.contains(&f.sheet_index()))
        .cloned()
        .collect())
}
