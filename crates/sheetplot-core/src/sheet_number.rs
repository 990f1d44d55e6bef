//! 图号文字清理
//!
//! 图签里的图号通常是 MText，内容夹带格式代码，例如 `{\fArial|b0;12}`。
//! 清理规则：
//! 1. 删除 `\P \f \H \A \W`、花括号、开头的 `1;` 以及 `.0000`
//! 2. 按 `;` 分段取最后一段并去掉首尾空白
//! 3. 只接受纯数字（可带一段小数）

use regex::Regex;
use std::sync::LazyLock;

static CONTROL_CODES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\P|\\f|\\H|\\A|\\W|\{|\}|\A1;|\.0000").expect("valid control code pattern")
});

static SHEET_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid sheet number pattern"));

/// 去掉格式代码，取最后一个 `;` 之后的内容
pub fn clean_text(raw: &str) -> String {
    let stripped = CONTROL_CODES.replace_all(raw, "");
    stripped
        .rsplit(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// 提取图号，不是数字时返回 None
pub fn parse_sheet_number(raw: &str) -> Option<String> {
    let value = clean_text(raw);
    SHEET_NUMBER.is_match(&value).then_some(value)
}
