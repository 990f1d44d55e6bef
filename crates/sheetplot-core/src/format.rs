//! GOST 幅面分类
//!
//! 按短边落在哪个区间确定基本幅面，长边除以基本长边得到倍数：
//!
//! | 短边区间 | 基本长边 | m=1 | m=2 | 其他 |
//! |---|---|---|---|---|
//! | 28000–31500 | 21000 | A4 | A3 | A4×m |
//! | 41000–43500 | 29700 | A3 | A2 | A3×m |
//! | 58000–61000 | 42000 | A2 | A1 | A2×m |
//! | 83000–86000 | 59400 | A1 | A0 | A1×m |
//! | 118000–121000 | 84100 | A0 | — | A0×m |
//! | 20000–22000 | — | A4 | | |
//!
//! 区间均为闭区间，单位是图形单位（1:100 毫米）。

/// 竖向标记
pub const VERTICAL_MARKER: &str = " верт.";

/// 倍数符号
pub const MULTIPLIER_SIGN: char = '×';

/// 幅面区间
#[derive(Debug, Clone, Copy)]
struct FormatBand {
    short_min: f64,
    short_max: f64,
    base_edge: f64,
    base: &'static str,
    /// m=2 时的幅面名，None 表示按 `base×2` 命名
    doubled: Option<&'static str>,
}

const FORMAT_BANDS: [FormatBand; 5] = [
    FormatBand { short_min: 28000.0, short_max: 31500.0, base_edge: 21000.0, base: "A4", doubled: Some("A3") },
    FormatBand { short_min: 41000.0, short_max: 43500.0, base_edge: 29700.0, base: "A3", doubled: Some("A2") },
    FormatBand { short_min: 58000.0, short_max: 61000.0, base_edge: 42000.0, base: "A2", doubled: Some("A1") },
    FormatBand { short_min: 83000.0, short_max: 86000.0, base_edge: 59400.0, base: "A1", doubled: Some("A0") },
    FormatBand { short_min: 118000.0, short_max: 121000.0, base_edge: 84100.0, base: "A0", doubled: None },
];

/// 窄A4区间（不看长边）
const NARROW_A4_BAND: (f64, f64) = (20000.0, 22000.0);

impl FormatBand {
    fn contains(&self, short: f64) -> bool {
        self.short_min <= short && short <= self.short_max
    }

    fn label(&self, long: f64) -> String {
        let multiplier = (long / self.base_edge).round_ties_even() as i64;
        match (multiplier, self.doubled) {
            (1, _) => self.base.to_string(),
            (2, Some(doubled)) => doubled.to_string(),
            (m, _) => format!("{}{}{}", self.base, MULTIPLIER_SIGN, m),
        }
    }
}

/// 按短边/长边分类，不属于任何区间时返回 None
pub fn classify(short: f64, long: f64) -> Option<String> {
    if let Some(band) = FORMAT_BANDS.iter().find(|band| band.contains(short)) {
        return Some(band.label(long));
    }

    let (narrow_min, narrow_max) = NARROW_A4_BAND;
    if narrow_min <= short && short <= narrow_max {
        return Some("A4".to_string());
    }

    None
}

/// 由图框宽高得到完整标签（含竖向标记）
///
/// `width`/`height` 应是已经取整的尺寸。
pub fn format_label(width: f64, height: f64) -> Option<String> {
    let short = width.min(height);
    let long = width.max(height);

    let mut label = classify(short, long)?;
    if width < height && !label.contains(MULTIPLIER_SIGN) {
        label.push_str(VERTICAL_MARKER);
    }
    Some(label)
}
