use crate::model::{Corpus, TermCount};
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfRow {
    pub doc_id: DocId,
    pub word: String,
    pub n: u32,
    pub tf: f64,
    pub idf: f64,
    pub tf_idf: f64,
}

/// `ln(num_docs / df)`. Zero when the word is in every document.
pub fn idf(num_docs: usize, df: usize) -> f64 {
    (num_docs as f64 / df as f64).ln()
}

/// Score term-count rows against the document set they describe.
///
/// The document count `J` is the number of distinct `doc_id`s with at least one
/// non-zero row, so running this on a slice of a corpus gives that slice's idf.
/// Rows with `n == 0` are skipped, and with them any document whose total is 0.
/// Output rows keep input order.
pub fn compute_tfidf(rows: &[TermCount]) -> Vec<TfIdfRow> {
    let live = || rows.iter().filter(|r| r.n > 0);

    let mut doc_totals: HashMap<&str, u64> = HashMap::new();
    let mut df: HashMap<&str, usize> = HashMap::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for row in live() {
        *doc_totals.entry(row.doc_id.as_str()).or_insert(0) += row.n as u64;
        if seen.insert((row.doc_id.as_str(), row.word.as_str())) {
            *df.entry(row.word.as_str()).or_insert(0) += 1;
        }
    }
    let num_docs = doc_totals.len();
    tracing::debug!(num_docs, vocabulary = df.len(), rows = rows.len(), "computing tf-idf");

    live()
        .map(|row| {
            let tf = row.n as f64 / doc_totals[row.doc_id.as_str()] as f64;
            let idf = idf(num_docs, df[row.word.as_str()]);
            TfIdfRow {
                doc_id: row.doc_id.clone(),
                word: row.word.clone(),
                n: row.n,
                tf,
                idf,
                tf_idf: tf * idf,
            }
        })
        .collect()
}

/// TF-IDF over every document of `corpus` that has tokens.
pub fn corpus_tfidf(corpus: &Corpus) -> Vec<TfIdfRow> {
    for doc_id in corpus.empty_documents() {
        tracing::debug!(doc_id, "empty document left out of tf-idf");
    }
    compute_tfidf(&corpus.term_counts())
}

/// Highest tf-idf first; equal scores keep their input order.
pub fn rank_desc(rows: &mut [TfIdfRow]) {
    rows.sort_by(|a, b| b.tf_idf.total_cmp(&a.tf_idf));
}

/// Lowest tf-idf first; equal scores keep their input order.
pub fn rank_asc(rows: &mut [TfIdfRow]) {
    rows.sort_by(|a, b| a.tf_idf.total_cmp(&b.tf_idf));
}

/// The `n` best-scoring words of each document, documents in first-seen order.
pub fn top_n_per_doc(rows: &[TfIdfRow], n: usize) -> Vec<TfIdfRow> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<TfIdfRow>> = HashMap::new();
    for row in rows {
        groups
            .entry(row.doc_id.as_str())
            .or_insert_with(|| {
                order.push(row.doc_id.as_str());
                Vec::new()
            })
            .push(row.clone());
    }
    let mut out = Vec::new();
    for doc_id in order {
        if let Some(mut group) = groups.remove(doc_id) {
            rank_desc(&mut group);
            out.extend(group.into_iter().take(n));
        }
    }
    out
}
