//! Turning Go source trees into interface and struct records.

pub mod declarations;
pub mod extractor;
pub mod parser;
pub mod universe;

pub use declarations::SourceUnit;
pub use extractor::{extract_corpus, Diagnostic, ExtractedCorpus, ExtractionOptions};
