use crate::tokenizer::Tokenizer;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: DocId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub text: String,
}

impl Document {
    pub fn new(doc_id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self { doc_id: doc_id.into(), category: None, text: text.into() }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOccurrence {
    pub doc_id: DocId,
    pub word: String,
    pub position: usize,
}

/// Occurrences of one word in one document, `n >= 1` once aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub doc_id: DocId,
    pub word: String,
    pub n: u32,
}

impl TermCount {
    pub fn new(doc_id: impl Into<DocId>, word: impl Into<String>, n: u32) -> Self {
        Self { doc_id: doc_id.into(), word: word.into(), n }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub word: String,
    pub n: u32,
}

/// A document as the corpus knows it: identity and label, no text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocInfo {
    pub doc_id: DocId,
    pub category: Option<String>,
}

/// In-memory table of (document, word) occurrences.
///
/// Documents are kept even when they contribute no tokens, so that a slice
/// which empties a document still reports it through [`Corpus::empty_documents`].
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<DocInfo>,
    occurrences: Vec<TokenOccurrence>,
}

impl Corpus {
    /// Tokenize `docs` into a new corpus. A repeated `doc_id` is skipped.
    pub fn build(docs: &[Document], tokenizer: &Tokenizer) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut infos = Vec::with_capacity(docs.len());
        let mut occurrences = Vec::new();
        for doc in docs {
            if !seen.insert(doc.doc_id.as_str()) {
                tracing::warn!(doc_id = %doc.doc_id, "duplicate document name, skipping");
                continue;
            }
            infos.push(DocInfo { doc_id: doc.doc_id.clone(), category: doc.category.clone() });
            let before = occurrences.len();
            occurrences.extend(tokenizer.tokenize_document(doc));
            if occurrences.len() == before {
                tracing::warn!(doc_id = %doc.doc_id, "document yields no tokens");
            }
        }
        tracing::debug!(num_docs = infos.len(), num_tokens = occurrences.len(), "corpus built");
        Self { docs: infos, occurrences }
    }

    pub fn documents(&self) -> &[DocInfo] { &self.docs }

    pub fn occurrences(&self) -> &[TokenOccurrence] { &self.occurrences }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    /// Documents with zero token occurrences.
    pub fn empty_documents(&self) -> Vec<&str> {
        let present: HashSet<&str> = self.occurrences.iter().map(|o| o.doc_id.as_str()).collect();
        self.docs
            .iter()
            .filter(|d| !present.contains(d.doc_id.as_str()))
            .map(|d| d.doc_id.as_str())
            .collect()
    }

    fn doc_rank(&self) -> HashMap<&str, usize> {
        self.docs.iter().enumerate().map(|(i, d)| (d.doc_id.as_str(), i)).collect()
    }

    /// Aggregate occurrences into one row per (doc_id, word).
    ///
    /// Rows come out in document order, then in order of each word's first
    /// occurrence within its document.
    pub fn term_counts(&self) -> Vec<TermCount> {
        let rank = self.doc_rank();
        let mut ordered: Vec<&TokenOccurrence> = self.occurrences.iter().collect();
        ordered.sort_by_key(|o| rank.get(o.doc_id.as_str()).copied().unwrap_or(usize::MAX));

        let mut rows: Vec<TermCount> = Vec::new();
        let mut index: HashMap<(&str, &str), usize> = HashMap::new();
        for occ in ordered {
            let key = (occ.doc_id.as_str(), occ.word.as_str());
            match index.get(&key) {
                Some(&i) => rows[i].n += 1,
                None => {
                    index.insert(key, rows.len());
                    rows.push(TermCount::new(occ.doc_id.clone(), occ.word.clone(), 1));
                }
            }
        }
        rows
    }

    /// Corpus-wide word frequencies, most frequent first (ties keep first-seen order).
    pub fn word_totals(&self) -> Vec<(String, u32)> {
        let mut totals: Vec<(String, u32)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for occ in &self.occurrences {
            match index.get(occ.word.as_str()) {
                Some(&i) => totals[i].1 += 1,
                None => {
                    index.insert(occ.word.as_str(), totals.len());
                    totals.push((occ.word.clone(), 1));
                }
            }
        }
        totals.sort_by(|a, b| b.1.cmp(&a.1));
        totals
    }

    /// Word frequencies per category label. Unlabelled documents are left out.
    pub fn category_counts(&self) -> Vec<CategoryCount> {
        let labels: HashMap<&str, &str> = self
            .docs
            .iter()
            .filter_map(|d| d.category.as_deref().map(|c| (d.doc_id.as_str(), c)))
            .collect();
        let mut rows: Vec<CategoryCount> = Vec::new();
        let mut index: HashMap<(&str, &str), usize> = HashMap::new();
        for occ in &self.occurrences {
            let Some(&category) = labels.get(occ.doc_id.as_str()) else { continue };
            let key = (category, occ.word.as_str());
            match index.get(&key) {
                Some(&i) => rows[i].n += 1,
                None => {
                    index.insert(key, rows.len());
                    rows.push(CategoryCount { category: category.to_string(), word: occ.word.clone(), n: 1 });
                }
            }
        }
        rows
    }

    /// Restrict to the named documents. Unknown names are ignored.
    pub fn subset<I, S>(&self, doc_ids: I) -> Corpus
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: HashSet<String> = doc_ids.into_iter().map(|s| s.as_ref().to_string()).collect();
        self.retain_docs(|d| wanted.contains(&d.doc_id))
    }

    pub fn in_category(&self, category: &str) -> Corpus {
        self.retain_docs(|d| d.category.as_deref() == Some(category))
    }

    /// Drop every occurrence of the given words; documents themselves stay.
    pub fn without_words(&self, words: &HashSet<String>) -> Corpus {
        Corpus {
            docs: self.docs.clone(),
            occurrences: self
                .occurrences
                .iter()
                .filter(|o| !words.contains(&o.word))
                .cloned()
                .collect(),
        }
    }

    fn retain_docs<F: Fn(&DocInfo) -> bool>(&self, keep: F) -> Corpus {
        let docs: Vec<DocInfo> = self.docs.iter().filter(|d| keep(d)).cloned().collect();
        let ids: HashSet<&str> = docs.iter().map(|d| d.doc_id.as_str()).collect();
        let occurrences = self
            .occurrences
            .iter()
            .filter(|o| ids.contains(o.doc_id.as_str()))
            .cloned()
            .collect();
        Corpus { docs, occurrences }
    }
}
