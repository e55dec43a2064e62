use crate::pdf::paths::{PathKind, RgbColor, VectorPath};

/// 注釈レイヤーにおけるパスの役割
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Ignored,
    /// テキスト上の開いた線（ハイライト・下線）
    TextUnderline,
    /// 画像として切り出す領域を囲む白い線
    ImageMask,
}

type Rule = (fn(&VectorPath) -> bool, PathClass);

/// 上から順に評価し、最初に一致したルールを採用する。
/// 開いた白い線は常に `TextUnderline` になる。
const RULES: &[Rule] = &[
    (is_open_line, PathClass::TextUnderline),
    (is_white_line, PathClass::ImageMask),
];

fn is_open_line(path: &VectorPath) -> bool {
    path.kind == PathKind::Line && !path.closed
}

/// 白でストロークされた線。塗りのみのパスは `color` が `None` なので該当しない。
fn is_white_line(path: &VectorPath) -> bool {
    path.kind == PathKind::Line && path.color == Some(RgbColor::WHITE)
}

pub fn classify(path: &VectorPath) -> PathClass {
    RULES
        .iter()
        .find(|(matches, _)| matches(path))
        .map(|&(_, class)| class)
        .unwrap_or(PathClass::Ignored)
}

/// 1ページ分のパスを分類ごとに描画順で保持する。
#[derive(Debug, Default)]
pub struct ClassifiedPaths<'a> {
    pub text_underline: Vec<&'a VectorPath>,
    pub image_mask: Vec<&'a VectorPath>,
}

pub fn partition(paths: &[VectorPath]) -> ClassifiedPaths<'_> {
    let mut classified = ClassifiedPaths::default();
    for path in paths {
        match classify(path) {
            PathClass::TextUnderline => classified.text_underline.push(path),
            PathClass::ImageMask => classified.image_mask.push(path),
            PathClass::Ignored => {}
        }
    }
    classified
}
