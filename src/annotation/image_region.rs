use std::io::Cursor;

use base64::Engine;
use image::{DynamicImage, ImageFormat};
use tracing::warn;

use crate::pdf::page::PageSource;
use crate::pdf::paths::VectorPath;

/// 画像をPNGにエンコードする。
pub fn encode_png(image: &DynamicImage) -> crate::error::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// マスクパス1つの領域を描画・切り出しし、base64のPNGにする。
pub fn extract_region<P: PageSource + ?Sized>(
    source: &P,
    path: &VectorPath,
) -> crate::error::Result<String> {
    let image = source.render_region(&path.rect)?;
    let png = encode_png(&image)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(&png))
}

/// マスク領域をパス順にすべて切り出す。
/// 描画やエンコードに失敗した領域は警告を出して除外する。
pub fn extract_regions<P: PageSource + ?Sized>(source: &P, mask_paths: &[&VectorPath]) -> Vec<String> {
    mask_paths
        .iter()
        .filter_map(|path| match extract_region(source, path) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                warn!(rect = ?path.rect, error = %e, "failed to extract masked region");
                None
            }
        })
        .collect()
}
