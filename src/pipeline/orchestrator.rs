// 全ページ実行

use crate::pdf::page::PageSource;
use crate::pipeline::PageResult;
use crate::pipeline::page_processor::process_page;

/// Run every page in order, numbering them from 1.
///
/// Pages are independent; grouping state never crosses a page boundary, and
/// a page that cannot be read degrades on its own without affecting others.
pub fn assemble_pages<P, I>(pages: I) -> Vec<PageResult>
where
    P: PageSource,
    I: IntoIterator<Item = P>,
{
    pages
        .into_iter()
        .enumerate()
        .map(|(index, source)| process_page(index as u32, &source))
        .collect()
}
