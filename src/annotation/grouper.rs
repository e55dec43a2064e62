use crate::annotation::locator::TextFragment;

/// 断片をハイライトのスパンにつなぎ合わせる。
///
/// 直前の断片の終端のちょうど1文字後（`offset + length + 1`）から始まる断片は
/// 保留中のスパンに連結する。ページテキスト上で空白1つか改行1つを挟んで
/// 隣接している場合にあたる。
/// オフセット不明の断片は前のスパンに連結されず、後続の断片も連結しない。
#[derive(Debug, Default)]
pub struct HighlightGrouper {
    pending: Option<String>,
    expected: Option<usize>,
    spans: Vec<String>,
}

impl HighlightGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &TextFragment) {
        let contiguous = fragment.char_offset.is_some() && fragment.char_offset == self.expected;

        if let Some(span) = self.pending.as_mut()
            && contiguous
        {
            span.push(' ');
            span.push_str(&fragment.text);
        } else {
            // 最初の断片、または非連続: 保留中のスパンを確定して新しく開始
            self.flush();
            self.pending = Some(fragment.text.clone());
        }

        self.expected = fragment
            .char_offset
            .map(|offset| offset + fragment.length + 1);
    }

    pub fn finish(mut self) -> Vec<String> {
        self.flush();
        self.spans
    }

    fn flush(&mut self) {
        if let Some(span) = self.pending.take()
            && !span.is_empty()
        {
            self.spans.push(span);
        }
    }
}

/// 1ページ分の断片を順にグループ化する。
pub fn group_fragments(fragments: &[TextFragment]) -> Vec<String> {
    let mut grouper = HighlightGrouper::new();
    for fragment in fragments {
        grouper.push(fragment);
    }
    grouper.finish()
}
