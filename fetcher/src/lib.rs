pub mod extract;
pub mod fetch;
pub mod robots;

use corpus::records::DocRecord;
use corpus::Manifest;
use extract::TextExtractor;
use fetch::FetchOutcome;
use std::path::{Path, PathBuf};

pub use fetch::{fetch_all, Fetch, FetchError, HttpFetcher, Politeness};

/// What became of a successful fetch batch on disk.
#[derive(Debug, Default)]
pub struct Collected {
    pub records: Vec<DocRecord>,
    pub pdfs: Vec<PathBuf>,
    /// Names of HTML documents whose extracted text is empty.
    pub empty: Vec<String>,
    /// Names of PDFs that could not be written to disk.
    pub failed: Vec<String>,
}

/// Turn fetched responses into document records. HTML becomes text; PDFs are
/// written to `pdf_dir` for positioned-word extraction. A PDF that cannot be
/// written is listed in [`Collected::failed`] and the rest are still collected.
pub fn collect(outcome: FetchOutcome, manifest: &Manifest, extractor: &TextExtractor, pdf_dir: &Path) -> Collected {
    let mut collected = Collected::default();
    for doc in outcome.fetched {
        let name = doc.descriptor.name.clone();
        if doc.response.is_pdf() || doc.descriptor.is_pdf() {
            match extract::save_pdf(pdf_dir, &name, &doc.response.body) {
                Ok(path) => {
                    tracing::info!(%name, path = %path.display(), "saved pdf");
                    collected.pdfs.push(path);
                }
                Err(e) => {
                    tracing::warn!(%name, error = %e, "could not save pdf");
                    collected.failed.push(name);
                }
            }
            continue;
        }
        let text = extractor.extract(&String::from_utf8_lossy(&doc.response.body));
        if text.is_empty() {
            tracing::warn!(%name, "no text extracted, keeping as empty document");
            collected.empty.push(name.clone());
        }
        collected.records.push(DocRecord {
            category: manifest.category_of(&name).map(str::to_string),
            name,
            url: Some(doc.url.to_string()),
            text,
            fetched_at: Some(doc.fetched_at),
        });
    }
    collected
}
