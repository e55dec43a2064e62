pub mod document_runner;
pub mod orchestrator;
pub mod page_processor;

use serde::Serialize;

/// Extraction result for one page, in the shape the web client consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    /// 1-based physical page number.
    pub page: u32,
    /// Base64-encoded PNG crops of the masked regions, in drawing order.
    pub images: Vec<String>,
    /// Grouped highlight spans, in drawing order.
    pub annotations: Vec<String>,
}
