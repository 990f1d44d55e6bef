//! 图框识别
//!
//! 流程：
//! 1. 一次性枚举文档全部实体
//! 2. 块参照/外部参照取包围盒，按 GOST 幅面分类
//! 3. 在图框内、靠近右下角的文字中找图号（先到先得）
//! 4. 按 X 升序、Y 降序排序后重新编号

use crate::entity::{DocumentReader, EntityRecord};
use crate::error::AnalyzeError;
use crate::format::format_label;
use crate::frame::{round_extent, Frame, UNKNOWN_SHEET_NUMBER};
use crate::math::{BoundingBox3, Point2};
use crate::sheet_number::parse_sheet_number;
use std::cmp::Ordering;
use tracing::{debug, info};

/// 图号文字到图框右下角的最大距离（不含）
pub const SHEET_NUMBER_RADIUS: f64 = 16000.0;

/// 一次识别的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionReport {
    /// 扫描的实体总数
    pub entities_scanned: usize,
    /// 块参照/外部参照数量
    pub candidates: usize,
    /// 取不到包围盒的候选
    pub unreadable: usize,
    /// 尺寸不属于任何幅面的候选
    pub unclassified: usize,
    /// 没有找到图号的图框
    pub unresolved_sheet_numbers: usize,
}

/// 图框识别器
pub struct FrameAnalyzer<'a, R: DocumentReader + ?Sized> {
    document: &'a R,
}

impl<'a, R: DocumentReader + ?Sized> FrameAnalyzer<'a, R> {
    pub fn new(document: &'a R) -> Self {
        Self { document }
    }

    /// 识别全部图框
    pub fn detect(&self) -> Result<Vec<Frame>, AnalyzeError> {
        self.detect_with_report().map(|(frames, _)| frames)
    }

    /// 识别全部图框并返回统计
    pub fn detect_with_report(&self) -> Result<(Vec<Frame>, DetectionReport), AnalyzeError> {
        let entities = self.document.entities()?;
        let mut report = DetectionReport {
            entities_scanned: entities.len(),
            ..Default::default()
        };

        let mut frames = Vec::new();

        for entity in entities.iter().filter(|e| e.kind.is_frame_candidate()) {
            report.candidates += 1;

            let Some(bounds) = entity.bounds else {
                report.unreadable += 1;
                continue;
            };

            let width = round_extent(bounds.max.x - bounds.min.x);
            let height = round_extent(bounds.max.y - bounds.min.y);

            let Some(label) = format_label(width, height) else {
                debug!(
                    "Skipping {} {}x{}: no matching format",
                    entity.kind.class_name(),
                    width,
                    height
                );
                report.unclassified += 1;
                continue;
            };

            let sheet_number = find_sheet_number(&entities, &bounds).unwrap_or_else(|| {
                report.unresolved_sheet_numbers += 1;
                UNKNOWN_SHEET_NUMBER.to_string()
            });

            debug!("Frame {} {}x{} sheet {}", label, width, height, sheet_number);
            frames.push(Frame::new(0, sheet_number, label, bounds));
        }

        let frames = order_frames(frames);

        info!(
            "Detected {} frames from {} entities ({} candidates, {} unreadable, {} unclassified)",
            frames.len(),
            report.entities_scanned,
            report.candidates,
            report.unreadable,
            report.unclassified
        );

        Ok((frames, report))
    }
}

/// 查找图号：第一个落在图框内且距右下角足够近的数字文字
fn find_sheet_number(entities: &[EntityRecord], bounds: &BoundingBox3) -> Option<String> {
    let corner = bounds.bottom_right();

    entities
        .iter()
        .filter(|e| e.kind.is_text())
        .filter_map(|e| Some((e.insertion_point?, e.text.as_deref()?)))
        .filter(|(ins, _)| bounds.contains_xy(ins))
        .filter(|(ins, _)| (Point2::new(ins.x, ins.y) - corner).norm() < SHEET_NUMBER_RADIUS)
        .find_map(|(_, text)| parse_sheet_number(text))
}

/// 阅读顺序：X 升序，X 相同时 Y 降序；排序后从1开始编号
fn order_frames(mut frames: Vec<Frame>) -> Vec<Frame> {
    frames.sort_by(|a, b| {
        let (a, b) = (a.min_corner(), b.min_corner());
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal))
    });

    frames
        .into_iter()
        .enumerate()
        .map(|(i, frame)| frame.renumbered(i as u32 + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::error::DocumentError;
    use crate::math::Point3;
    use proptest::prelude::*;

    fn frame_at(x: f64, y: f64, w: f64, h: f64) -> EntityRecord {
        EntityRecord::block_reference(Point3::new(x, y, 0.0), Point3::new(x + w, y + h, 0.0))
    }

    struct Unreachable;

    impl DocumentReader for Unreachable {
        fn entities(&self) -> Result<Vec<EntityRecord>, DocumentError> {
            Err(DocumentError::Unavailable("no active document".into()))
        }
    }

    #[test]
    fn test_detect_classifies_and_numbers() {
        let entities = vec![
            frame_at(0.0, 0.0, 42000.0, 29700.0),
            EntityRecord::text(Point3::new(40000.0, 1000.0, 0.0), "3"),
        ];

        let frames = FrameAnalyzer::new(&entities).detect().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].format_label(), "A3");
        assert_eq!(frames[0].sheet_number(), "3");
        assert_eq!(frames[0].sheet_index(), 1);
    }

    #[test]
    fn test_skips_non_frames() {
        let mut no_bbox = EntityRecord::new(EntityKind::BlockReference);
        no_bbox.bounds = None;
        let line = EntityRecord::new(EntityKind::Other("AcDbLine".into())).with_bounds(
            BoundingBox3::new(Point3::origin(), Point3::new(42000.0, 29700.0, 0.0)),
        );
        let entities = vec![
            no_bbox,
            line,
            frame_at(0.0, 0.0, 5000.0, 5000.0),
            frame_at(0.0, 0.0, 21000.0, 29700.0),
        ];

        let (frames, report) = FrameAnalyzer::new(&entities).detect_with_report().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].format_label(), "A4 верт.");
        assert_eq!(report.entities_scanned, 4);
        assert_eq!(report.candidates, 3);
        assert_eq!(report.unreadable, 1);
        assert_eq!(report.unclassified, 1);
        assert_eq!(report.unresolved_sheet_numbers, 1);
    }

    #[test]
    fn test_external_reference_is_candidate() {
        let xref = EntityRecord::new(EntityKind::ExternalReference).with_bounds(BoundingBox3::new(
            Point3::origin(),
            Point3::new(59400.0, 42000.0, 0.0),
        ));
        let frames = FrameAnalyzer::new(&vec![xref]).detect().unwrap();
        assert_eq!(frames[0].format_label(), "A2");
    }

    #[test]
    fn test_sheet_number_first_fit() {
        let entities = vec![
            frame_at(0.0, 0.0, 42000.0, 29700.0),
            // 不是数字，继续查找
            EntityRecord::text(Point3::new(41000.0, 500.0, 0.0), "Лист"),
            // 较远但先出现
            EntityRecord::mtext(Point3::new(30000.0, 5000.0, 0.0), r"{\fArial;7}"),
            // 更近但后出现
            EntityRecord::text(Point3::new(41900.0, 100.0, 0.0), "8"),
        ];
        let frames = FrameAnalyzer::new(&entities).detect().unwrap();
        assert_eq!(frames[0].sheet_number(), "7");
    }

    #[test]
    fn test_sheet_number_must_be_inside_and_near() {
        let entities = vec![
            frame_at(0.0, 0.0, 42000.0, 29700.0),
            // 框外
            EntityRecord::text(Point3::new(42500.0, 100.0, 0.0), "1"),
            // 框内但距右下角 >= 16000
            EntityRecord::text(Point3::new(26000.0, 0.0, 0.0), "2"),
            // 左下角
            EntityRecord::text(Point3::new(100.0, 100.0, 0.0), "3"),
        ];
        let frames = FrameAnalyzer::new(&entities).detect().unwrap();
        assert_eq!(frames[0].sheet_number(), UNKNOWN_SHEET_NUMBER);
    }

    #[test]
    fn test_reading_order() {
        let entities = vec![
            frame_at(50000.0, 0.0, 42000.0, 29700.0),
            frame_at(0.0, 0.0, 42000.0, 29700.0),
            frame_at(0.0, 40000.0, 42000.0, 29700.0),
        ];
        let frames = FrameAnalyzer::new(&entities).detect().unwrap();
        let corners: Vec<_> = frames.iter().map(|f| (f.min_corner().x, f.min_corner().y)).collect();
        assert_eq!(corners, vec![(0.0, 40000.0), (0.0, 0.0), (50000.0, 0.0)]);
        let indices: Vec<_> = frames.iter().map(|f| f.sheet_index()).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_detect_is_idempotent() {
        let entities = vec![
            frame_at(0.0, 0.0, 42000.0, 29700.0),
            frame_at(45000.0, 0.0, 29700.0, 21000.0),
            EntityRecord::text(Point3::new(74000.0, 500.0, 0.0), "2"),
        ];
        let analyzer = FrameAnalyzer::new(&entities);
        assert_eq!(analyzer.detect().unwrap(), analyzer.detect().unwrap());
    }

    #[test]
    fn test_unreachable_document() {
        let result = FrameAnalyzer::new(&Unreachable).detect();
        assert!(matches!(result, Err(AnalyzeError::ServiceUnavailable(_))));
    }

    #[test]
    fn test_empty_document() {
        let entities: Vec<EntityRecord> = Vec::new();
        assert!(FrameAnalyzer::new(&entities).detect().unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn frames_follow_reading_order(origins in prop::collection::vec((0i32..20, 0i32..20), 1..12)) {
            let entities: Vec<_> = origins
                .iter()
                .map(|(x, y)| frame_at(*x as f64 * 50000.0, *y as f64 * 40000.0, 42000.0, 29700.0))
                .collect();
            let frames = FrameAnalyzer::new(&entities).detect().unwrap();
            prop_assert_eq!(frames.len(), entities.len());
            for pair in frames.windows(2) {
                let (a, b) = (pair[0].min_corner(), pair[1].min_corner());
                prop_assert!(a.x < b.x || (a.x == b.x && a.y >= b.y));
                prop_assert_eq!(pair[1].sheet_index(), pair[0].sheet_index() + 1);
            }
        }
    }
}
