// ドキュメント単位: PDF読込 -> 色シグネチャ置換 -> パス解析 -> ページ処理

use tracing::{info, warn};

use crate::config::settings::Settings;
use crate::pdf::page::PageGeometry;
use crate::pdf::reader::PdfReader;
use crate::pdf::stream_color::normalize_highlight_color;
use crate::pipeline::PageResult;
use crate::pipeline::orchestrator::assemble_pages;
use crate::render::pdfium::{PdfiumPage, create_pdfium, load_document};

/// Extract highlights and masked regions from one PDF.
///
/// Phase A: open with lopdf (malformed input fails the whole document)
/// Phase B: rewrite the highlight color signature in every stream
/// Phase C: decode vector paths per page (rayon parallel when enabled) and
///          read each page's crop box and rotation
/// Phase D: reload the rewritten document in pdfium and process pages in order
pub fn extract_document(bytes: &[u8], settings: &Settings) -> crate::error::Result<Vec<PageResult>> {
    // --- Phase A ---
    let mut reader = PdfReader::from_bytes(bytes)?;
    let page_count = reader.page_count();

    // --- Phase B: must complete before any page is decoded ---
    normalize_highlight_color(reader.document_mut());

    // --- Phase C ---
    let mut page_paths = reader.all_vector_paths(settings.parallel_pages);
    let mut geometries = reader.all_page_geometries();

    // --- Phase D ---
    let normalized = reader.save_to_bytes()?;
    let pdfium = create_pdfium(settings.pdfium_lib_path.as_ref())?;
    let document = load_document(&pdfium, normalized)?;

    let pdfium_page_count = document.pages().len() as usize;
    if pdfium_page_count != page_paths.len() {
        warn!(
            lopdf_pages = page_paths.len(),
            pdfium_pages = pdfium_page_count,
            "page count mismatch between parsers"
        );
    }
    page_paths.resize_with(pdfium_page_count, Vec::new);
    geometries.resize_with(pdfium_page_count, PageGeometry::default);

    let sources = document
        .pages()
        .iter()
        .zip(page_paths)
        .zip(geometries)
        .map(|((page, paths), geometry)| PdfiumPage::new(page, paths, geometry, settings.dpi));

    let results = assemble_pages(sources);

    info!(
        pages = page_count,
        annotations = results.iter().map(|r| r.annotations.len()).sum::<usize>(),
        images = results.iter().map(|r| r.images.len()).sum::<usize>(),
        "document processed"
    );

    Ok(results)
}
