//! Source manifest: the named documents to analyse and where to fetch them.
//!
//! ```json
//! {
//!   "base_url": "https://en.wikipedia.org/wiki/",
//!   "sources": [
//!     { "name": "Golden Retriever", "url": "Golden_Retriever" },
//!     { "name": "Terms", "url": "https://example.com/terms.pdf",
//!       "use_fonts": [9, 10], "page_range": [1, "Inf"] }
//!   ],
//!   "categories": { "Golden Retriever": "dogs" }
//! }
//! ```
//!
//! Each descriptor is validated on its own; a bad entry is reported and the
//! rest of the manifest is still usable.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("descriptor #{index} ({identity}) is missing required field `{missing}`")]
    MalformedDescriptor { index: usize, identity: String, missing: &'static str },
    #[error("descriptor #{index} repeats the name `{name}`")]
    DuplicateName { index: usize, name: String },
    #[error("descriptor #{index} ({identity}) has an invalid page range: {reason}")]
    InvalidPageRange { index: usize, identity: String, reason: String },
    #[error("descriptor #{index} ({identity}) could not be read: {reason}")]
    Unreadable { index: usize, identity: String, reason: String },
}

/// Inclusive page range; `last == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: u32,
    pub last: Option<u32>,
}

impl PageRange {
    pub fn new(first: u32, last: Option<u32>) -> Self { Self { first, last } }

    pub fn contains(&self, page: u32) -> bool {
        page >= self.first && self.last.map_or(true, |last| page <= last)
    }

    /// Parse `[first, last]` where `last` is a page number, `"Inf"` or `null`.
    pub fn from_value(value: &Value) -> std::result::Result<Self, String> {
        let items = value.as_array().ok_or_else(|| format!("expected [first, last], got {value}"))?;
        if items.len() != 2 {
            return Err(format!("expected two elements, got {}", items.len()));
        }
        let first = page_number(&items[0])?;
        let last = match &items[1] {
            Value::Null => None,
            Value::String(s) if s.eq_ignore_ascii_case("inf") => None,
            other => Some(page_number(other)?),
        };
        if first == 0 {
            return Err("pages start at 1".to_string());
        }
        if let Some(last) = last {
            if last < first {
                return Err(format!("last page {last} is before first page {first}"));
            }
        }
        Ok(Self { first, last })
    }
}

impl Default for PageRange {
    fn default() -> Self { Self { first: 1, last: None } }
}

fn page_number(value: &Value) -> std::result::Result<u32, String> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| format!("`{value}` is not a page number"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    pub url: String,
    pub category: Option<String>,
    /// Font heights whose words make up the text; `None` keeps every word.
    pub use_fonts: Option<BTreeSet<u32>>,
    pub page_range: PageRange,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category: None,
            use_fonts: None,
            page_range: PageRange::default(),
        }
    }

    /// Whether this entry describes a PDF rather than an HTML page.
    pub fn is_pdf(&self) -> bool {
        self.use_fonts.is_some()
            || self.page_range != PageRange::default()
            || self.url.to_ascii_lowercase().ends_with(".pdf")
    }
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    name: Option<String>,
    url: Option<String>,
    category: Option<String>,
    use_fonts: Option<BTreeSet<u32>>,
    page_range: Option<Value>,
}

fn identity(name: Option<&str>, url: Option<&str>) -> String {
    match (name, url) {
        (Some(name), _) => format!("name `{name}`"),
        (None, Some(url)) => format!("url `{url}`"),
        (None, None) => "anonymous".to_string(),
    }
}

impl RawDescriptor {
    fn validate(self, index: usize) -> std::result::Result<SourceDescriptor, SourceError> {
        let identity = identity(self.name.as_deref(), self.url.as_deref());
        let page_range = match &self.page_range {
            None => PageRange::default(),
            Some(v) => PageRange::from_value(v).map_err(|reason| SourceError::InvalidPageRange {
                index,
                identity: identity.clone(),
                reason,
            })?,
        };
        let name = self.name.filter(|n| !n.trim().is_empty()).ok_or_else(|| {
            SourceError::MalformedDescriptor { index, identity: identity.clone(), missing: "name" }
        })?;
        let url = self.url.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
            SourceError::MalformedDescriptor { index, identity: identity.clone(), missing: "url" }
        })?;
        Ok(SourceDescriptor { name, url, category: self.category, use_fonts: self.use_fonts, page_range })
    }
}

pub fn parse_descriptor(index: usize, value: Value) -> std::result::Result<SourceDescriptor, SourceError> {
    // read before the typed parse, which may fail
    let id = identity(
        value.get("name").and_then(Value::as_str),
        value.get("url").and_then(Value::as_str),
    );
    let raw: RawDescriptor = serde_json::from_value(value)
        .map_err(|e| SourceError::Unreadable { index, identity: id, reason: e.to_string() })?;
    raw.validate(index)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawManifest {
    Full {
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        sources: Vec<Value>,
        #[serde(default)]
        categories: HashMap<String, String>,
    },
    List(Vec<Value>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub base_url: Option<String>,
    pub sources: Vec<SourceDescriptor>,
    /// doc_id -> category label.
    pub categories: HashMap<String, String>,
}

/// A manifest together with the entries that failed validation.
#[derive(Debug, Clone, Default)]
pub struct ManifestReport {
    pub manifest: Manifest,
    pub rejected: Vec<SourceError>,
}

impl Manifest {
    /// Parse a manifest. Only a document that is not a manifest at all is an
    /// error; bad descriptors land in [`ManifestReport::rejected`].
    pub fn from_json(text: &str) -> Result<ManifestReport> {
        let raw: RawManifest = serde_json::from_str(text).context("manifest is not a JSON object or array")?;
        let (base_url, values, categories) = match raw {
            RawManifest::Full { base_url, sources, categories } => (base_url, sources, categories),
            RawManifest::List(sources) => (None, sources, HashMap::new()),
        };

        let mut names: HashSet<String> = HashSet::new();
        let mut sources = Vec::new();
        let mut rejected = Vec::new();
        for (index, value) in values.into_iter().enumerate() {
            let parsed = parse_descriptor(index, value).and_then(|d| {
                if names.insert(d.name.clone()) {
                    Ok(d)
                } else {
                    Err(SourceError::DuplicateName { index, name: d.name })
                }
            });
            match parsed {
                Ok(d) => sources.push(d),
                Err(e) => {
                    tracing::warn!(error = %e, "rejecting source descriptor");
                    rejected.push(e);
                }
            }
        }
        tracing::info!(accepted = sources.len(), rejected = rejected.len(), "manifest loaded");
        Ok(ManifestReport { manifest: Manifest { base_url, sources, categories }, rejected })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<ManifestReport> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading manifest {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn find(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// A descriptor's own category wins over the `categories` map.
    pub fn category_of(&self, doc_id: &str) -> Option<&str> {
        self.find(doc_id)
            .and_then(|s| s.category.as_deref())
            .or_else(|| self.categories.get(doc_id).map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_range_forms() {
        assert_eq!(PageRange::from_value(&json!([1, "Inf"])).unwrap(), PageRange::new(1, None));
        assert_eq!(PageRange::from_value(&json!([2, null])).unwrap(), PageRange::new(2, None));
        assert_eq!(PageRange::from_value(&json!([3, 9])).unwrap(), PageRange::new(3, Some(9)));
        assert!(PageRange::from_value(&json!([9, 3])).is_err());
        assert!(PageRange::from_value(&json!([0, 3])).is_err());
        assert!(PageRange::from_value(&json!([1, "soon"])).is_err());
        assert!(PageRange::from_value(&json!(4)).is_err());
    }

    #[test]
    fn page_range_contains() {
        let r = PageRange::new(2, Some(4));
        assert!(!r.contains(1));
        assert!(r.contains(2) && r.contains(4));
        assert!(!r.contains(5));
        assert!(PageRange::default().contains(10_000));
    }

    #[test]
    fn descriptor_missing_fields_reports_identity() {
        let err = parse_descriptor(3, json!({ "url": "https://x/y" })).unwrap_err();
        assert_eq!(
            err,
            SourceError::MalformedDescriptor { index: 3, identity: "url `https://x/y`".into(), missing: "name" }
        );
        let err = parse_descriptor(0, json!({ "name": "Dog" })).unwrap_err();
        assert!(matches!(err, SourceError::MalformedDescriptor { missing: "url", .. }));
        assert!(err.to_string().contains("name `Dog`"));
    }

    #[test]
    fn unreadable_descriptor_keeps_identity() {
        let err = parse_descriptor(1, json!({ "name": "Dog", "url": "x", "use_fonts": "nine" })).unwrap_err();
        assert!(matches!(err, SourceError::Unreadable { index: 1, ref identity, .. } if identity == "name `Dog`"));
        assert!(err.to_string().contains("name `Dog`"));

        let err = parse_descriptor(2, json!("not an object")).unwrap_err();
        assert!(matches!(err, SourceError::Unreadable { ref identity, .. } if identity == "anonymous"));
    }

    #[test]
    fn pdf_detection() {
        assert!(SourceDescriptor::new("a", "https://x/doc.PDF").is_pdf());
        assert!(!SourceDescriptor::new("a", "https://x/Dog").is_pdf());
        let mut d = SourceDescriptor::new("a", "https://x/download?id=1");
        d.use_fonts = Some([9].into_iter().collect());
        assert!(d.is_pdf());
    }

    #[test]
    fn manifest_keeps_good_entries() {
        let text = r#"{
            "base_url": "https://en.wikipedia.org/wiki/",
            "sources": [
                { "name": "Dog", "url": "Dog", "category": "animals" },
                { "url": "Cat" },
                { "name": "Dog", "url": "Dog_again" },
                { "name": "Terms", "url": "t.pdf", "use_fonts": [9, 10], "page_range": [1, "Inf"] },
                { "name": "Bad", "url": "b.pdf", "page_range": [5, 1] },
                "not an object"
            ],
            "categories": { "Terms": "legal", "Dog": "ignored" }
        }"#;
        let report = Manifest::from_json(text).unwrap();
        let m = &report.manifest;
        assert_eq!(m.sources.len(), 2);
        assert_eq!(report.rejected.len(), 4);
        assert!(matches!(report.rejected[1], SourceError::DuplicateName { index: 2, .. }));
        assert!(matches!(report.rejected[2], SourceError::InvalidPageRange { index: 4, .. }));
        assert!(matches!(report.rejected[3], SourceError::Unreadable { index: 5, .. }));
        assert_eq!(m.category_of("Dog"), Some("animals"));
        assert_eq!(m.category_of("Terms"), Some("legal"));
        assert_eq!(m.category_of("Nope"), None);
        let terms = m.find("Terms").unwrap();
        assert_eq!(terms.use_fonts.as_ref().map(|f| f.len()), Some(2));
    }

    #[test]
    fn manifest_may_be_a_bare_list() {
        let report = Manifest::from_json(r#"[{ "name": "A", "url": "https://a" }]"#).unwrap();
        assert_eq!(report.manifest.sources.len(), 1);
        assert!(report.manifest.base_url.is_none());
    }

    #[test]
    fn non_manifest_is_an_error() {
        assert!(Manifest::from_json("42").is_err());
    }
}
