use tracing::{debug, warn};

use crate::pdf::page::PageSource;
use crate::pdf::paths::VectorPath;

/// ハイライトされた語句と、ページテキスト上でのその位置。
///
/// オフセットと長さはバイトではなく文字数で数える。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    pub text: String,
    /// ページテキストにそのまま現れない場合は `None`
    pub char_offset: Option<usize>,
    pub length: usize,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, char_offset: Option<usize>) -> Self {
        let text = text.into();
        let length = text.chars().count();
        Self {
            text,
            char_offset,
            length,
        }
    }
}

/// 改行を空白に置き換えて前後を除去する。空の場合は `None` を返す。
pub fn normalize_needle(raw: &str) -> Option<String> {
    let needle = raw.replace('\n', " ");
    let needle = needle.trim();
    if needle.is_empty() {
        None
    } else {
        Some(needle.to_string())
    }
}

/// `haystack` 中で最初に `needle` が現れる位置（文字オフセット）
pub fn find_char_offset(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte_idx| haystack[..byte_idx].chars().count())
}

/// 下線パスごとに、その下にあるテキストをパス順に取り出す。
///
/// 空のテキストは断片にしない。テキスト取得に失敗したパスは警告を出して飛ばす。
pub fn locate_fragments<P: PageSource + ?Sized>(
    source: &P,
    page_text: &str,
    underline_paths: &[&VectorPath],
) -> Vec<TextFragment> {
    let mut fragments = Vec::with_capacity(underline_paths.len());

    for path in underline_paths {
        let raw = match source.text_in_rect(&path.rect) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(rect = ?path.rect, error = %e, "text lookup failed, skipping path");
                continue;
            }
        };

        let Some(needle) = normalize_needle(&raw) else {
            continue;
        };

        let char_offset = find_char_offset(page_text, &needle);
        if char_offset.is_none() {
            debug!(needle = %needle, "highlighted text not found in page text");
        }
        fragments.push(TextFragment::new(needle, char_offset));
    }

    fragments
}
