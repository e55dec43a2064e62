use thiserror::Error;

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Content stream error: {0}")]
    ContentStreamError(String),

    #[error("Stream rewrite error: {0}")]
    StreamRewriteError(String),

    #[error("Text extraction error: {0}")]
    TextError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Image encode error: {0}")]
    ImageEncodeError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`HighlightError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl HighlightError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a malformed document error.
    malformed => MalformedDocument,
    /// Create a configuration error.
    config => ConfigError,
    /// Create a content stream error.
    content_stream => ContentStreamError,
    /// Create a stream rewrite error.
    stream_rewrite => StreamRewriteError,
    /// Create a text extraction error.
    text => TextError,
    /// Create a render error.
    render => RenderError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
    /// Create a request error.
    request => RequestError,
}

impl From<lopdf::Error> for HighlightError {
    fn from(e: lopdf::Error) -> Self {
        Self::MalformedDocument(e.to_string())
    }
}

impl From<serde_yml::Error> for HighlightError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<pdfium_render::prelude::PdfiumError> for HighlightError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for HighlightError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageEncodeError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HighlightError>;
