//! 单页PDF输出
//!
//! 页面内容用 PDF 绘图操作描述（`m`/`l`/`S` 画线，`re W n` 裁剪），
//! 文档结构交给 lopdf 生成。坐标单位是 pt（1/72 英寸），原点在页面左下角。

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// 毫米转 pt
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// 页面内容流
#[derive(Debug, Default, Clone)]
pub struct PageContent {
    operations: Vec<Operation>,
}

impl PageContent {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    pub fn save_state(&mut self) {
        self.push("q", vec![]);
    }

    pub fn restore_state(&mut self) {
        self.push("Q", vec![]);
    }

    /// 设置裁剪矩形
    pub fn clip_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push("re", vec![real(x), real(y), real(w), real(h)]);
        self.push("W", vec![]);
        self.push("n", vec![]);
    }

    /// 描边灰度（0 为黑）
    pub fn stroke_gray(&mut self, gray: f64) {
        self.push("G", vec![real(gray)]);
    }

    pub fn line_width(&mut self, width: f64) {
        self.push("w", vec![real(width)]);
    }

    /// 画一条线段
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.push("m", vec![real(x1), real(y1)]);
        self.push("l", vec![real(x2), real(y2)]);
        self.push("S", vec![]);
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    fn encode(&self) -> Result<Vec<u8>, lopdf::Error> {
        Content {
            operations: self.operations.clone(),
        }
        .encode()
    }
}

/// 生成单页 PDF 文件内容
pub fn single_page(width_pt: f64, height_pt: f64, content: &PageContent) -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), real(width_pt), real(height_pt)],
        "Contents" => content_id,
        "Resources" => dictionary! {},
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal("SheetPlot"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
