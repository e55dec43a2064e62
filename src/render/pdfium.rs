// pdfium-render wrapper: page text, text-in-rect and region rendering

use std::cell::RefCell;
use std::path::PathBuf;

use image::DynamicImage;
use pdfium_render::prelude::*;

use crate::error::HighlightError;
use crate::pdf::content_stream::Rect;
use crate::pdf::page::{PageGeometry, PageSource};
use crate::pdf::paths::VectorPath;

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `pdfium_lib_path` from settings
/// 2. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
///
/// Returns `None` when neither is set, in which case the system library is used.
fn resolve_pdfium_lib_path(configured: Option<&PathBuf>) -> crate::error::Result<Option<PathBuf>> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(Some(path.clone()));
        }
        return Err(HighlightError::render(format!(
            "pdfium_lib_path is set to '{}' but the path does not exist",
            path.display()
        )));
    }

    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(Some(p));
        }
        return Err(HighlightError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{}' but the path does not exist",
            path
        )));
    }

    Ok(None)
}

/// Creates a new Pdfium instance by dynamically loading the shared library.
pub fn create_pdfium(configured: Option<&PathBuf>) -> crate::error::Result<Pdfium> {
    let bindings = match resolve_pdfium_lib_path(configured)? {
        Some(lib_path) => {
            let lib_path_str = lib_path.to_str().ok_or_else(|| {
                HighlightError::render("pdfium library path contains non-UTF-8 characters")
            })?;
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| HighlightError::render(format!("failed to bind pdfium: {e}")))?;
    Ok(Pdfium::new(bindings))
}

/// Loads PDF bytes into pdfium. Load failures are reported as malformed input.
pub fn load_document(pdfium: &Pdfium, bytes: Vec<u8>) -> crate::error::Result<PdfDocument<'_>> {
    pdfium
        .load_pdf_from_byte_vec(bytes, None)
        .map_err(|e| HighlightError::malformed(e.to_string()))
}

/// pdfium reports line breaks as `\r\n`; the page text model uses a single `\n`.
fn normalize_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// One pdfium page plus the vector paths and box geometry read by lopdf.
///
/// The full-page bitmap is rendered lazily and reused for every region on
/// the page.
pub struct PdfiumPage<'a> {
    page: PdfPage<'a>,
    paths: Vec<VectorPath>,
    geometry: PageGeometry,
    dpi: u32,
    rendered: RefCell<Option<DynamicImage>>,
}

impl<'a> PdfiumPage<'a> {
    pub fn new(
        page: PdfPage<'a>,
        paths: Vec<VectorPath>,
        geometry: PageGeometry,
        dpi: u32,
    ) -> Self {
        Self {
            page,
            paths,
            geometry,
            dpi,
            rendered: RefCell::new(None),
        }
    }

    /// Renders the whole page (without annotations) at the configured DPI.
    fn render_page(&self) -> crate::error::Result<DynamicImage> {
        // PDF default user unit: 1 point = 1/72 inch
        let scale = self.dpi as f32 / 72.0;
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .render_annotations(false);

        let bitmap = self.page.render_with_config(&config)?;

        Ok(bitmap.as_image())
    }
}

impl PageSource for PdfiumPage<'_> {
    fn plain_text(&self) -> crate::error::Result<String> {
        let text = self
            .page
            .text()
            .map_err(|e| HighlightError::text(e.to_string()))?;
        Ok(normalize_line_breaks(&text.all()))
    }

    fn vector_paths(&self) -> crate::error::Result<Vec<VectorPath>> {
        Ok(self.paths.clone())
    }

    fn text_in_rect(&self, rect: &Rect) -> crate::error::Result<String> {
        let text = self
            .page
            .text()
            .map_err(|e| HighlightError::text(e.to_string()))?;
        let bounds = PdfRect::new_from_values(
            rect.y0 as f32,
            rect.x0 as f32,
            rect.y1 as f32,
            rect.x1 as f32,
        );
        Ok(normalize_line_breaks(&text.inside_rect(bounds)))
    }

    fn render_region(&self, rect: &Rect) -> crate::error::Result<DynamicImage> {
        let mut rendered = self.rendered.borrow_mut();
        if rendered.is_none() {
            *rendered = Some(self.render_page()?);
        }
        let Some(page_image) = rendered.as_ref() else {
            return Err(HighlightError::render("page bitmap unavailable"));
        };

        crop_region(page_image, rect, &self.geometry)
    }
}

/// Crops a page-space rectangle out of a full-page bitmap.
///
/// pdfium renders the crop box with /Rotate applied, so the rectangle is
/// clamped to the crop box, shifted to its origin and turned into display
/// space (y down) before scaling to pixels. Degenerate regions grow to at
/// least one pixel.
pub fn crop_region(
    page_image: &DynamicImage,
    rect: &Rect,
    geometry: &PageGeometry,
) -> crate::error::Result<DynamicImage> {
    let image_width = page_image.width();
    let image_height = page_image.height();
    let (display_width, display_height) = geometry.display_size();
    if image_width == 0 || image_height == 0 || display_width <= 0.0 || display_height <= 0.0 {
        return Err(HighlightError::render("rendered page has zero dimensions"));
    }

    let Some(visible) = rect.intersect(&geometry.crop_box) else {
        return Err(HighlightError::render(format!(
            "region {:?} does not overlap the page",
            rect
        )));
    };

    let (ax, ay) = geometry.to_display(visible.x0, visible.y0);
    let (bx, by) = geometry.to_display(visible.x1, visible.y1);

    let scale_x = image_width as f64 / display_width;
    let scale_y = image_height as f64 / display_height;

    let left = ((ax.min(bx) * scale_x).floor() as u32).min(image_width);
    let mut right = ((ax.max(bx) * scale_x).ceil() as u32).min(image_width);
    let top = ((ay.min(by) * scale_y).floor() as u32).min(image_height);
    let mut bottom = ((ay.max(by) * scale_y).ceil() as u32).min(image_height);

    if right <= left {
        right = (left + 1).min(image_width);
    }
    if bottom <= top {
        bottom = (top + 1).min(image_height);
    }
    if right <= left || bottom <= top {
        return Err(HighlightError::render(format!(
            "region {:?} is empty after scaling",
            rect
        )));
    }

    Ok(page_image.crop_imm(left, top, right - left, bottom - top))
}
