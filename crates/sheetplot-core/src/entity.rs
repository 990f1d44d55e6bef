//! 宿主文档实体的只读视图
//!
//! 核心只读取实体，不修改。每个 [`EntityRecord`] 是一次枚举时的快照，
//! 拿不到的属性（例如某些实体没有包围盒）用 `None` 表示。

use crate::error::DocumentError;
use crate::math::{BoundingBox3, Point3};
use serde::{Deserialize, Serialize};

/// 实体类型标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// AcDbBlockReference
    BlockReference,
    /// AcDbExternalReference
    ExternalReference,
    /// AcDbText
    Text,
    /// AcDbMText
    MText,
    /// 其他实体，保留原始类名
    Other(String),
}

impl EntityKind {
    /// 由宿主的实体类名解析
    pub fn from_class_name(name: &str) -> Self {
        match name {
            "AcDbBlockReference" => EntityKind::BlockReference,
            "AcDbExternalReference" => EntityKind::ExternalReference,
            "AcDbText" => EntityKind::Text,
            "AcDbMText" => EntityKind::MText,
            other => EntityKind::Other(other.to_string()),
        }
    }

    /// 宿主的实体类名
    pub fn class_name(&self) -> &str {
        match self {
            EntityKind::BlockReference => "AcDbBlockReference",
            EntityKind::ExternalReference => "AcDbExternalReference",
            EntityKind::Text => "AcDbText",
            EntityKind::MText => "AcDbMText",
            EntityKind::Other(name) => name,
        }
    }

    /// 是否可能是图框
    pub fn is_frame_candidate(&self) -> bool {
        matches!(self, EntityKind::BlockReference | EntityKind::ExternalReference)
    }

    /// 是否是文字类实体
    pub fn is_text(&self) -> bool {
        matches!(self, EntityKind::Text | EntityKind::MText)
    }
}

/// 实体快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub kind: EntityKind,
    /// 包围盒，取不到时为 None
    pub bounds: Option<BoundingBox3>,
    /// 文字插入点
    pub insertion_point: Option<Point3>,
    /// 原始文字内容（可能含 MText 格式代码）
    pub text: Option<String>,
}

impl EntityRecord {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            bounds: None,
            insertion_point: None,
            text: None,
        }
    }

    /// 创建块参照
    pub fn block_reference(min: Point3, max: Point3) -> Self {
        Self::new(EntityKind::BlockReference).with_bounds(BoundingBox3::new(min, max))
    }

    /// 创建单行文字
    pub fn text(insertion_point: Point3, text: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Text,
            bounds: None,
            insertion_point: Some(insertion_point),
            text: Some(text.into()),
        }
    }

    /// 创建多行文字
    pub fn mtext(insertion_point: Point3, text: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::MText,
            ..Self::text(insertion_point, text)
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox3) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// 文档读取能力
///
/// 宿主CAD文档的抽象。实现方一次性返回全部实体；
/// 只有完全无法访问文档时才返回错误。
pub trait DocumentReader {
    fn entities(&self) -> Result<Vec<EntityRecord>, DocumentError>;
}

impl DocumentReader for [EntityRecord] {
    fn entities(&self) -> Result<Vec<EntityRecord>, DocumentError> {
        Ok(self.to_vec())
    }
}

impl DocumentReader for Vec<EntityRecord> {
    fn entities(&self) -> Result<Vec<EntityRecord>, DocumentError> {
        Ok(self.clone())
    }
}
