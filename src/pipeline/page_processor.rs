// ページ単位: パス分類 -> (テキスト位置特定 -> グループ化) / (マスク領域切り出し)

use tracing::{debug, warn};

use crate::annotation::classifier::partition;
use crate::annotation::grouper::group_fragments;
use crate::annotation::image_region::extract_regions;
use crate::annotation::locator::locate_fragments;
use crate::pdf::page::PageSource;
use crate::pipeline::PageResult;

/// Process a single page: classify paths -> locate + group highlights,
/// and crop masked regions.
///
/// `page_index` is 0-based; the result carries the 1-based page number.
/// Failures never escape a page. Without page text the page keeps its masked
/// regions and reports no annotations; without paths it reports nothing.
/// Per-path failures are logged and the item is left out.
pub fn process_page<P: PageSource + ?Sized>(page_index: u32, source: &P) -> PageResult {
    let page = page_index + 1;

    let paths = source.vector_paths().unwrap_or_else(|e| {
        warn!(page, error = %e, "vector paths unavailable, skipping page");
        Vec::new()
    });

    let classified = partition(&paths);
    debug!(
        page,
        paths = paths.len(),
        underlines = classified.text_underline.len(),
        masks = classified.image_mask.len(),
        "classified page paths"
    );

    let annotations = if classified.text_underline.is_empty() {
        Vec::new()
    } else {
        match source.plain_text() {
            Ok(page_text) => {
                let fragments = locate_fragments(source, &page_text, &classified.text_underline);
                group_fragments(&fragments)
            }
            Err(e) => {
                warn!(page, error = %e, "page text unavailable, annotations skipped");
                Vec::new()
            }
        }
    };

    let images = extract_regions(source, &classified.image_mask);

    PageResult {
        page,
        images,
        annotations,
    }
}
