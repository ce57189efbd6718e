use anyhow::{bail, Result};
use corpus::pdf::{filter_words, segment, sections_to_documents, words_to_text};
use corpus::records::{load_documents, DocRecord};
use corpus::tfidf::{corpus_tfidf, top_n_per_doc};
use corpus::{
    CategoryCount, Corpus, Document, Manifest, PageRange, PositionedWord, SegmenterConfig, Segmentation, TfIdfRow,
    Tokenizer, TokenizerConfig,
};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOptions {
    pub stopwords: bool,
    pub no_stem: bool,
    pub nfkc: bool,
}

impl TokenOptions {
    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(TokenizerConfig { stem: !self.no_stem, remove_stopwords: self.stopwords, nfkc: self.nfkc })
    }
}

/// Which part of the corpus to score.
#[derive(Debug, Clone, Default)]
pub struct Slice {
    pub category: Option<String>,
    pub exclude_title_words: bool,
}

/// Documents from `input`, labelled through the manifest's category map.
pub fn read_documents(input: &str, manifest: Option<&Manifest>) -> Result<Vec<Document>> {
    let empty = HashMap::new();
    let categories = manifest.map_or(&empty, |m| &m.categories);
    let docs: Vec<Document> = load_documents(input)?
        .into_iter()
        .map(|rec| {
            let mut doc = rec.into_document(categories);
            if let Some(label) = manifest.and_then(|m| m.find(&doc.doc_id)).and_then(|s| s.category.clone()) {
                doc.category = Some(label);
            }
            doc
        })
        .collect();
    tracing::info!(input, documents = docs.len(), "documents loaded");
    Ok(docs)
}

pub fn word_counts(docs: &[Document], tokenizer: &Tokenizer, top: usize) -> Vec<(String, u32)> {
    let mut totals = Corpus::build(docs, tokenizer).word_totals();
    totals.truncate(top);
    totals
}

/// Per-category word counts, the `top` most frequent words of each category.
pub fn category_counts(docs: &[Document], tokenizer: &Tokenizer, top: usize) -> Vec<CategoryCount> {
    let mut rows = Corpus::build(docs, tokenizer).category_counts();
    // stable: categories keep first-seen order, words within a category by count
    let mut order: Vec<String> = Vec::new();
    for r in &rows {
        if !order.contains(&r.category) {
            order.push(r.category.clone());
        }
    }
    rows.sort_by(|a, b| {
        let ia = order.iter().position(|c| *c == a.category);
        let ib = order.iter().position(|c| *c == b.category);
        ia.cmp(&ib).then(b.n.cmp(&a.n))
    });
    let mut kept: HashMap<String, usize> = HashMap::new();
    rows.retain(|r| {
        let seen = kept.entry(r.category.clone()).or_insert(0);
        *seen += 1;
        *seen <= top
    });
    rows
}

/// Top `top` tf-idf words per document over the requested slice.
pub fn tfidf_report(docs: &[Document], tokenizer: &Tokenizer, slice: &Slice, top: usize) -> Result<Vec<TfIdfRow>> {
    let mut corpus = Corpus::build(docs, tokenizer);
    if let Some(category) = &slice.category {
        corpus = corpus.in_category(category);
        if corpus.is_empty() {
            bail!("no documents in category `{category}`");
        }
    }
    if slice.exclude_title_words {
        corpus = corpus.without_words(&tokenizer.title_words(docs));
    }
    Ok(top_n_per_doc(&corpus_tfidf(&corpus), top))
}

pub fn sections(words: Vec<PositionedWord>, config: &SegmenterConfig) -> Segmentation {
    let seg = segment(words, config);
    tracing::info!(headings = seg.headings.len(), dropped = seg.dropped, "segmented");
    seg
}

/// Tf-idf across the sections of one PDF, each section a document.
pub fn section_tfidf(seg: &Segmentation, tokenizer: &Tokenizer, category: Option<&str>, top: usize) -> Vec<TfIdfRow> {
    let docs = sections_to_documents(&seg.sections, category);
    top_n_per_doc(&corpus_tfidf(&Corpus::build(&docs, tokenizer)), top)
}

/// Collapse a PDF's positioned words into a single document record.
pub fn pdf_document(
    words: Vec<PositionedWord>,
    name: &str,
    use_fonts: Option<&BTreeSet<u32>>,
    pages: &PageRange,
    category: Option<String>,
) -> DocRecord {
    let kept = filter_words(words, use_fonts, pages);
    if kept.is_empty() {
        tracing::warn!(name, "no words left after font and page filtering");
    }
    DocRecord { name: name.to_string(), category, url: None, text: words_to_text(&kept), fetched_at: None }
}
