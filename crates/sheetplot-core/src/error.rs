//! 识别阶段错误定义

use thiserror::Error;

/// 宿主文档访问错误
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Document service unavailable: {0}")]
    Unavailable(String),

    #[error("Document read failed: {0}")]
    Read(String),
}

/// 图框识别错误
///
/// 单个实体的问题（无包围盒、无法分类、找不到图号）不会出现在这里，
/// 它们只会让该实体不进入结果。
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(#[from] DocumentError),
}
