// テキスト位置特定・グループ化・マスク領域切り出しのテスト

use base64::Engine;
use highlight_extract::annotation::grouper::{HighlightGrouper, group_fragments};
use highlight_extract::annotation::image_region::{encode_png, extract_regions};
use highlight_extract::annotation::locator::{
    TextFragment, find_char_offset, locate_fragments, normalize_needle,
};
use highlight_extract::error::HighlightError;
use highlight_extract::pdf::content_stream::Rect;
use highlight_extract::pdf::page::PageSource;
use highlight_extract::pdf::paths::{PathKind, RgbColor, VectorPath};
use image::{DynamicImage, Rgba, RgbaImage};

// ============================================================
// Helpers
// ============================================================

/// 矩形ごとにテキストを返すだけのページ
struct FakePage {
    text: String,
    /// (矩形, テキスト)。テキストが None の矩形は取得エラー
    regions: Vec<(Rect, Option<&'static str>)>,
    /// 描画に失敗する矩形
    broken: Vec<Rect>,
}

impl FakePage {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            regions: Vec::new(),
            broken: Vec::new(),
        }
    }
}

impl PageSource for FakePage {
    fn plain_text(&self) -> highlight_extract::error::Result<String> {
        Ok(self.text.clone())
    }

    fn vector_paths(&self) -> highlight_extract::error::Result<Vec<VectorPath>> {
        Ok(Vec::new())
    }

    fn text_in_rect(&self, rect: &Rect) -> highlight_extract::error::Result<String> {
        match self.regions.iter().find(|(r, _)| r == rect) {
            Some((_, Some(text))) => Ok(text.to_string()),
            Some((_, None)) => Err(HighlightError::text("lookup failed")),
            None => Ok(String::new()),
        }
    }

    fn render_region(&self, rect: &Rect) -> highlight_extract::error::Result<DynamicImage> {
        if self.broken.contains(rect) {
            return Err(HighlightError::render("render failed"));
        }
        let w = rect.width().max(1.0) as u32;
        let h = rect.height().max(1.0) as u32;
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            w,
            h,
            Rgba([255, 0, 0, 255]),
        )))
    }
}

fn line_at(y: f64) -> VectorPath {
    VectorPath {
        kind: PathKind::Line,
        closed: false,
        color: Some(RgbColor::WHITE),
        stroked: true,
        filled: false,
        line_width: 10.0,
        rect: Rect::new(0.0, y, 100.0, y + 10.0),
    }
}

fn frag(text: &str, offset: Option<usize>) -> TextFragment {
    TextFragment::new(text, offset)
}

// ============================================================
// 1. locator
// ============================================================

#[test]
fn test_normalize_needle() {
    assert_eq!(normalize_needle("Hello\nWorld"), Some("Hello World".to_string()));
    assert_eq!(normalize_needle("  padded \n"), Some("padded".to_string()));
    assert_eq!(normalize_needle("   \n  "), None);
    assert_eq!(normalize_needle(""), None);
}

#[test]
fn test_find_char_offset_counts_chars() {
    assert_eq!(find_char_offset("Hello World", "World"), Some(6));
    assert_eq!(find_char_offset("Hello World", "Planet"), None);
    // マルチバイト文字はバイトではなく文字数で数える
    assert_eq!(find_char_offset("日本語 テキスト", "テキスト"), Some(4));
    // 最初の出現位置
    assert_eq!(find_char_offset("a b a b", "a"), Some(0));
}

#[test]
fn test_fragment_length_is_char_count() {
    let f = TextFragment::new("日本語", Some(0));
    assert_eq!(f.length, 3);
}

#[test]
fn test_locate_fragments_in_path_order() {
    let mut page = FakePage::new("Hello World again");
    let p1 = line_at(700.0);
    let p2 = line_at(600.0);
    page.regions.push((p1.rect, Some("World")));
    page.regions.push((p2.rect, Some("Hello")));

    let fragments = locate_fragments(&page, &page.text, &[&p1, &p2]);

    assert_eq!(
        fragments,
        vec![frag("World", Some(6)), frag("Hello", Some(0))]
    );
}

#[test]
fn test_locate_fragments_skips_blank_and_failed_lookups() {
    let mut page = FakePage::new("Hello World");
    let blank = line_at(700.0);
    let failing = line_at(650.0);
    let ok = line_at(600.0);
    page.regions.push((blank.rect, Some(" \n ")));
    page.regions.push((failing.rect, None));
    page.regions.push((ok.rect, Some("World\n")));

    let fragments = locate_fragments(&page, &page.text, &[&blank, &failing, &ok]);

    assert_eq!(fragments, vec![frag("World", Some(6))]);
}

#[test]
fn test_locate_fragment_not_found_keeps_text() {
    let mut page = FakePage::new("Hello World");
    let p = line_at(700.0);
    page.regions.push((p.rect, Some("Elsewhere")));

    let fragments = locate_fragments(&page, &page.text, &[&p]);

    assert_eq!(fragments, vec![frag("Elsewhere", None)]);
}

// ============================================================
// 2. grouper
// ============================================================

#[test]
fn test_group_contiguous_fragments() {
    let spans = group_fragments(&[frag("Hello", Some(0)), frag("World", Some(6))]);
    assert_eq!(spans, vec!["Hello World".to_string()]);
}

#[test]
fn test_group_non_contiguous_fragments() {
    let spans = group_fragments(&[frag("Hello", Some(0)), frag("World", Some(20))]);
    assert_eq!(spans, vec!["Hello".to_string(), "World".to_string()]);
}

#[test]
fn test_group_empty_input() {
    assert!(group_fragments(&[]).is_empty());
}

#[test]
fn test_group_three_way_chain() {
    let spans = group_fragments(&[
        frag("one", Some(0)),
        frag("two", Some(4)),
        frag("three", Some(8)),
        frag("four", Some(30)),
    ]);
    assert_eq!(spans, vec!["one two three".to_string(), "four".to_string()]);
}

#[test]
fn test_not_found_fragment_breaks_span_on_both_sides() {
    let spans = group_fragments(&[
        frag("Hello", Some(0)),
        frag("Zzz", None),
        frag("World", Some(6)),
    ]);
    assert_eq!(
        spans,
        vec!["Hello".to_string(), "Zzz".to_string(), "World".to_string()]
    );
}

#[test]
fn test_consecutive_not_found_fragments_are_separate() {
    let spans = group_fragments(&[frag("a", None), frag("b", None)]);
    assert_eq!(spans, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_out_of_order_fragments_are_not_joined() {
    let spans = group_fragments(&[frag("World", Some(6)), frag("Hello", Some(0))]);
    assert_eq!(spans, vec!["World".to_string(), "Hello".to_string()]);
}

#[test]
fn test_multibyte_fragments_join_by_char_offset() {
    let text = "日本語 テキスト";
    let a = frag("日本語", find_char_offset(text, "日本語"));
    let b = frag("テキスト", find_char_offset(text, "テキスト"));
    assert_eq!(group_fragments(&[a, b]), vec!["日本語 テキスト".to_string()]);
}

#[test]
fn test_grouper_incremental_push() {
    let mut grouper = HighlightGrouper::new();
    grouper.push(&frag("Hello", Some(0)));
    grouper.push(&frag("World", Some(6)));
    grouper.push(&frag("Bye", Some(40)));
    assert_eq!(
        grouper.finish(),
        vec!["Hello World".to_string(), "Bye".to_string()]
    );
}

#[test]
fn test_blank_underline_does_not_break_adjacency() {
    // 空白しか含まない下線は断片を作らないので、前後の断片はそのまま連結される
    let mut page = FakePage::new("Hello World");
    let hello = line_at(700.0);
    let blank = line_at(650.0);
    let world = line_at(600.0);
    page.regions.push((hello.rect, Some("Hello")));
    page.regions.push((blank.rect, Some("  ")));
    page.regions.push((world.rect, Some("World")));

    let fragments = locate_fragments(&page, &page.text, &[&hello, &blank, &world]);
    assert_eq!(group_fragments(&fragments), vec!["Hello World".to_string()]);
}

#[test]
fn test_fragments_on_separate_lines_join() {
    let mut page = FakePage::new("Hello\nWorld");
    let hello = line_at(700.0);
    let world = line_at(680.0);
    page.regions.push((hello.rect, Some("Hello")));
    page.regions.push((world.rect, Some("World")));

    let fragments = locate_fragments(&page, &page.text, &[&hello, &world]);
    assert_eq!(group_fragments(&fragments), vec!["Hello World".to_string()]);
}

// ============================================================
// 3. image_region
// ============================================================

#[test]
fn test_encode_png_signature() {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])));
    let png = encode_png(&image).expect("encode");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_extract_regions_are_base64_png_in_order() {
    let page = FakePage::new("");
    let mut small = line_at(0.0);
    small.rect = Rect::new(0.0, 0.0, 4.0, 3.0);
    let mut large = line_at(0.0);
    large.rect = Rect::new(10.0, 10.0, 30.0, 20.0);

    let images = extract_regions(&page, &[&small, &large]);
    assert_eq!(images.len(), 2);

    let dims: Vec<(u32, u32)> = images
        .iter()
        .map(|encoded| {
            let png = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .expect("base64");
            let img = image::load_from_memory(&png).expect("png");
            (img.width(), img.height())
        })
        .collect();
    assert_eq!(dims, vec![(4, 3), (20, 10)]);
}

#[test]
fn test_failed_region_is_omitted() {
    let mut page = FakePage::new("");
    let mut ok = line_at(0.0);
    ok.rect = Rect::new(0.0, 0.0, 5.0, 5.0);
    let bad = line_at(100.0);
    page.broken.push(bad.rect);

    let images = extract_regions(&page, &[&bad, &ok]);
    assert_eq!(images.len(), 1);
}
