use image::DynamicImage;

use crate::pdf::content_stream::Rect;
use crate::pdf::paths::VectorPath;

/// ページの表示領域と回転。
///
/// `crop_box` はページ空間でのMediaBoxとCropBoxの共通部分、
/// `rotation` は時計回りの /Rotate（0, 90, 180, 270 のいずれか）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub crop_box: Rect,
    pub rotation: u16,
}

impl Default for PageGeometry {
    /// MediaBoxが読めないページはLetterサイズ・回転なしとみなす。
    fn default() -> Self {
        Self {
            crop_box: Rect::new(0.0, 0.0, 612.0, 792.0),
            rotation: 0,
        }
    }
}

impl PageGeometry {
    /// 回転を適用した表示サイズ (幅, 高さ)
    pub fn display_size(&self) -> (f64, f64) {
        let (w, h) = (self.crop_box.width(), self.crop_box.height());
        match self.rotation {
            90 | 270 => (h, w),
            _ => (w, h),
        }
    }

    /// ページ空間の点を表示座標（原点左上、y軸下向き）に写す。
    pub fn to_display(&self, x: f64, y: f64) -> (f64, f64) {
        let u = x - self.crop_box.x0;
        let v = y - self.crop_box.y0;
        let (w, h) = (self.crop_box.width(), self.crop_box.height());
        match self.rotation {
            90 => (v, u),
            180 => (w - u, v),
            270 => (h - v, w - u),
            _ => (u, h - v),
        }
    }
}

/// 1ページ分のテキスト・パス・描画を提供する文書モデル。
///
/// 座標はすべてページ空間（PDFポイント、原点左下、y軸上向き）。
/// テキストの改行は `\n` 1文字で表す。
pub trait PageSource {
    /// ページ全体のプレーンテキスト
    fn plain_text(&self) -> crate::error::Result<String>;

    /// ページに描画されたパス（描画順）
    fn vector_paths(&self) -> crate::error::Result<Vec<VectorPath>>;

    /// 矩形内に含まれるテキスト
    fn text_in_rect(&self, rect: &Rect) -> crate::error::Result<String>;

    /// 注釈を含めずにページを描画し、矩形部分を切り出した画像
    fn render_region(&self, rect: &Rect) -> crate::error::Result<DynamicImage>;
}
