use anyhow::{anyhow, Context, Result};
use scraper::{Html, Selector};
use std::fs;
use std::path::{Path, PathBuf};

/// Pulls readable text out of HTML pages.
pub struct TextExtractor {
    selector: Selector,
}

impl TextExtractor {
    /// `css` picks the elements whose text is kept, e.g. `body` or `#mw-content-text p`.
    pub fn new(css: &str) -> Result<Self> {
        let selector = Selector::parse(css).map_err(|e| anyhow!("invalid selector `{css}`: {e:?}"))?;
        Ok(Self { selector })
    }

    /// Text of every matching element, whitespace collapsed to single spaces.
    pub fn extract(&self, html: &str) -> String {
        let doc = Html::parse_document(html);
        let mut words: Vec<&str> = Vec::new();
        for node in doc.select(&self.selector) {
            for chunk in node.text() {
                words.extend(chunk.split_whitespace());
            }
        }
        words.join(" ")
    }
}

/// File name for a downloaded PDF: the document name with anything outside
/// `[A-Za-z0-9_-]` replaced by `_`.
pub fn pdf_file_name(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{stem}.pdf")
}

pub fn save_pdf(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(pdf_file_name(name));
    fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
