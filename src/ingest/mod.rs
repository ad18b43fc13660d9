//! Offline ingestion: PDF OCR, chunking and index construction.

mod builder;
mod chunking;
pub mod ocr;

pub use builder::IndexBuilder;
pub use chunking::{RecursiveTextSplitter, DEFAULT_SEPARATORS};
pub use ocr::{format_pages, OcrError, OcrOptions, OcrTools};
