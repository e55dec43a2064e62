pub mod content_stream;
pub mod page;
pub mod paths;
pub mod reader;
pub mod stream_color;
