//! Word-level text analysis over small, fixed document sets.
//!
//! The pipeline is `Document` → [`tokenizer::Tokenizer`] → [`model::Corpus`] →
//! [`tfidf::compute_tfidf`]. Independently, positioned words extracted from a PDF
//! go through [`pdf::segment`] and come back out as one `Document` per section.

pub mod model;
pub mod pdf;
pub mod records;
pub mod source;
pub mod tfidf;
pub mod tokenizer;

pub use model::{CategoryCount, Corpus, DocInfo, Document, TermCount, TokenOccurrence};
pub use pdf::{Heading, LinedWord, PositionedWord, Section, SegmenterConfig, Segmentation};
pub use source::{Manifest, ManifestReport, PageRange, SourceDescriptor, SourceError};
pub use tfidf::{compute_tfidf, TfIdfRow};
pub use tokenizer::{NoStem, SnowballStemmer, Stem, Tokenizer, TokenizerConfig};

/// Unique document name, e.g. a Wikipedia page title or a PDF section heading.
pub type DocId = String;
