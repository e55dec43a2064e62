// ページ処理・全ページ組み立てのテスト

use highlight_extract::error::HighlightError;
use highlight_extract::pdf::content_stream::Rect;
use highlight_extract::pdf::page::PageSource;
use highlight_extract::pdf::paths::{PathKind, RgbColor, VectorPath, extract_vector_paths};
use highlight_extract::pipeline::PageResult;
use highlight_extract::pipeline::orchestrator::assemble_pages;
use highlight_extract::pipeline::page_processor::process_page;
use image::{DynamicImage, Rgba, RgbaImage};

// ============================================================
// Helpers
// ============================================================

/// パスと矩形内テキストを固定で返すページ
#[derive(Default)]
struct FakePage {
    text: String,
    paths: Vec<VectorPath>,
    regions: Vec<(Rect, &'static str)>,
    broken: Vec<Rect>,
    fail_text: bool,
    fail_paths: bool,
}

impl PageSource for FakePage {
    fn plain_text(&self) -> highlight_extract::error::Result<String> {
        if self.fail_text {
            return Err(HighlightError::text("no text layer"));
        }
        Ok(self.text.clone())
    }

    fn vector_paths(&self) -> highlight_extract::error::Result<Vec<VectorPath>> {
        if self.fail_paths {
            return Err(HighlightError::content_stream("unreadable content"));
        }
        Ok(self.paths.clone())
    }

    fn text_in_rect(&self, rect: &Rect) -> highlight_extract::error::Result<String> {
        Ok(self
            .regions
            .iter()
            .find(|(r, _)| r == rect)
            .map(|(_, t)| t.to_string())
            .unwrap_or_default())
    }

    fn render_region(&self, rect: &Rect) -> highlight_extract::error::Result<DynamicImage> {
        if self.broken.contains(rect) {
            return Err(HighlightError::render("render failed"));
        }
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            rect.width().max(1.0) as u32,
            rect.height().max(1.0) as u32,
            Rgba([0, 128, 255, 255]),
        )))
    }
}

fn underline(x0: f64, y: f64, x1: f64) -> VectorPath {
    VectorPath {
        kind: PathKind::Line,
        closed: false,
        color: Some(RgbColor::WHITE),
        stroked: true,
        filled: false,
        line_width: 12.0,
        rect: Rect::new(x0, y - 6.0, x1, y + 6.0),
    }
}

fn mask(x0: f64, y0: f64, x1: f64, y1: f64) -> VectorPath {
    VectorPath {
        kind: PathKind::Line,
        closed: true,
        color: Some(RgbColor::WHITE),
        stroked: true,
        filled: false,
        line_width: 0.0,
        rect: Rect::new(x0, y0, x1, y1),
    }
}

fn decoration() -> VectorPath {
    VectorPath {
        kind: PathKind::Rect,
        closed: false,
        color: None,
        stroked: false,
        filled: true,
        line_width: 1.0,
        rect: Rect::new(0.0, 0.0, 612.0, 20.0),
    }
}

// ============================================================
// 1. process_page
// ============================================================

#[test]
fn test_process_page_groups_and_crops() {
    let u1 = underline(72.0, 700.0, 110.0);
    let u2 = underline(115.0, 700.0, 160.0);
    let u3 = underline(72.0, 500.0, 140.0);
    let m1 = mask(100.0, 100.0, 140.0, 130.0);
    let m2 = mask(300.0, 300.0, 310.0, 305.0);

    let page = FakePage {
        text: "Hello World\nsome other text here".to_string(),
        paths: vec![
            decoration(),
            u1.clone(),
            m1.clone(),
            u2.clone(),
            u3.clone(),
            m2.clone(),
        ],
        regions: vec![(u1.rect, "Hello"), (u2.rect, "World"), (u3.rect, "text here")],
        ..Default::default()
    };

    let result = process_page(0, &page);

    assert_eq!(result.page, 1);
    assert_eq!(
        result.annotations,
        vec!["Hello World".to_string(), "text here".to_string()]
    );
    assert_eq!(result.images.len(), 2);
    // 白い閉じた枠2つ分
    assert!(!result.images[0].is_empty() && !result.images[1].is_empty());
}

#[test]
fn test_process_page_without_line_paths_is_empty() {
    let page = FakePage {
        text: "plain page".to_string(),
        paths: vec![decoration()],
        ..Default::default()
    };

    let result = process_page(4, &page);

    assert_eq!(
        result,
        PageResult {
            page: 5,
            images: Vec::new(),
            annotations: Vec::new(),
        }
    );
}

#[test]
fn test_process_page_omits_failed_crop() {
    let bad = mask(0.0, 0.0, 10.0, 10.0);
    let good = mask(50.0, 50.0, 60.0, 60.0);
    let page = FakePage {
        paths: vec![bad.clone(), good],
        broken: vec![bad.rect],
        ..Default::default()
    };

    let result = process_page(0, &page);
    assert_eq!(result.images.len(), 1);
}

#[test]
fn test_process_page_text_failure_degrades() {
    // テキスト層が読めなくてもマスク領域は切り出す
    let u = underline(72.0, 700.0, 110.0);
    let m = mask(100.0, 100.0, 140.0, 130.0);
    let page = FakePage {
        paths: vec![u.clone(), m],
        regions: vec![(u.rect, "Hello")],
        fail_text: true,
        ..Default::default()
    };

    let result = process_page(2, &page);

    assert_eq!(result.page, 3);
    assert!(result.annotations.is_empty());
    assert_eq!(result.images.len(), 1);
}

#[test]
fn test_process_page_path_failure_is_empty_page() {
    let page = FakePage {
        text: "Hello".to_string(),
        fail_paths: true,
        ..Default::default()
    };

    let result = process_page(0, &page);
    assert_eq!(
        result,
        PageResult {
            page: 1,
            images: Vec::new(),
            annotations: Vec::new(),
        }
    );
}

#[test]
fn test_process_page_from_decoded_content_stream() {
    // 置換済みの白い下線と白い閉じた枠
    let content = b"q 1 1 1 RG 12 w 72 700 m 120 700 l S Q \
                    q 1 1 1 RG 0 w 100 100 m 200 100 l 200 150 l 100 150 l h S Q \
                    0 0 0 rg 0 0 612 20 re f";
    let paths = extract_vector_paths(content).expect("parse");
    let underline_rect = paths[0].rect;

    let page = FakePage {
        text: "Hello".to_string(),
        paths,
        regions: vec![(underline_rect, "Hello")],
        ..Default::default()
    };

    let result = process_page(0, &page);
    assert_eq!(result.annotations, vec!["Hello".to_string()]);
    assert_eq!(result.images.len(), 1);
}

// ============================================================
// 2. assemble_pages
// ============================================================

#[test]
fn test_assemble_numbers_pages_from_one() {
    let u = underline(0.0, 10.0, 50.0);
    let pages = vec![
        FakePage::default(),
        FakePage {
            text: "Hello".to_string(),
            paths: vec![u.clone()],
            regions: vec![(u.rect, "Hello")],
            ..Default::default()
        },
        FakePage::default(),
    ];

    let results = assemble_pages(pages);

    let numbers: Vec<u32> = results.iter().map(|r| r.page).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(results[0].annotations.is_empty() && results[0].images.is_empty());
    assert_eq!(results[1].annotations, vec!["Hello".to_string()]);
    assert!(results[2].annotations.is_empty() && results[2].images.is_empty());
}

#[test]
fn test_assemble_survives_page_text_failure() {
    let u = underline(0.0, 10.0, 50.0);
    let m = mask(100.0, 100.0, 140.0, 130.0);
    let readable = || FakePage {
        text: "Hello".to_string(),
        paths: vec![u.clone()],
        regions: vec![(u.rect, "Hello")],
        ..Default::default()
    };
    let pages = vec![
        readable(),
        FakePage {
            paths: vec![u.clone(), m.clone()],
            regions: vec![(u.rect, "Hello")],
            fail_text: true,
            ..Default::default()
        },
        readable(),
    ];

    let results = assemble_pages(pages);

    let numbers: Vec<u32> = results.iter().map(|r| r.page).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(results[0].annotations, vec!["Hello".to_string()]);
    assert!(results[1].annotations.is_empty());
    assert_eq!(results[1].images.len(), 1);
    assert_eq!(results[2].annotations, vec!["Hello".to_string()]);
}

#[test]
fn test_grouping_does_not_cross_pages() {
    // 1ページ目の末尾と2ページ目の先頭はオフセット上は連続していても別スパン
    let a = underline(0.0, 10.0, 50.0);
    let b = underline(0.0, 10.0, 50.0);
    let pages = vec![
        FakePage {
            text: "Hello World".to_string(),
            paths: vec![a.clone()],
            regions: vec![(a.rect, "Hello")],
            ..Default::default()
        },
        FakePage {
            text: "Hello World".to_string(),
            paths: vec![b.clone()],
            regions: vec![(b.rect, "World")],
            ..Default::default()
        },
    ];

    let results = assemble_pages(pages);
    assert_eq!(results[0].annotations, vec!["Hello".to_string()]);
    assert_eq!(results[1].annotations, vec!["World".to_string()]);
}

#[test]
fn test_assemble_empty_document() {
    let results = assemble_pages(Vec::<FakePage>::new());
    assert!(results.is_empty());
}

#[test]
fn test_page_result_json_shape() {
    let result = PageResult {
        page: 2,
        images: vec!["aGk=".to_string()],
        annotations: vec!["Hello World".to_string()],
    };
    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!({
            "page": 2,
            "images": ["aGk="],
            "annotations": ["Hello World"],
        })
    );
}
