use crate::model::{Document, TokenOccurrence};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"^[a-z]+$").expect("valid regex");
    static ref DEFAULT_TOKENIZER: Tokenizer = Tokenizer::new(TokenizerConfig::default());
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Reduces an inflected word to its root form.
pub trait Stem {
    fn stem(&self, word: &str) -> String;
}

/// Snowball (Porter2) English stemmer.
pub struct SnowballStemmer(Stemmer);

impl SnowballStemmer {
    pub fn english() -> Self { Self(Stemmer::create(Algorithm::English)) }
}

impl Default for SnowballStemmer {
    fn default() -> Self { Self::english() }
}

impl Stem for SnowballStemmer {
    fn stem(&self, word: &str) -> String { self.0.stem(word).into_owned() }
}

/// Identity stemmer: words are kept exactly as filtered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStem;

impl Stem for NoStem {
    fn stem(&self, word: &str) -> String { word.to_string() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Apply the Snowball English stemmer.
    pub stem: bool,
    /// Drop common English function words before stemming.
    pub remove_stopwords: bool,
    /// NFKC-normalize the text first, folding ligatures such as "ﬁ" into "fi".
    /// Folded full-width letters then pass the `^[a-z]+$` filter.
    pub nfkc: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { stem: true, remove_stopwords: false, nfkc: false }
    }
}

/// Whitespace split, lowercase, keep `^[a-z]+$`, stem.
pub struct Tokenizer {
    stemmer: Box<dyn Stem + Send + Sync>,
    remove_stopwords: bool,
    nfkc: bool,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        let stemmer: Box<dyn Stem + Send + Sync> = if config.stem {
            Box::new(SnowballStemmer::english())
        } else {
            Box::new(NoStem)
        };
        Self { stemmer, remove_stopwords: config.remove_stopwords, nfkc: config.nfkc }
    }

    /// Replace the stemming step with a custom implementation.
    pub fn with_stemmer<S: Stem + Send + Sync + 'static>(mut self, stemmer: S) -> Self {
        self.stemmer = Box::new(stemmer);
        self
    }

    /// Tokenize text into (word, position), where position is the index of the
    /// whitespace-delimited token the word came from.
    pub fn tokenize(&self, text: &str) -> Vec<(String, usize)> {
        let normalized: String = if self.nfkc { text.nfkc().collect() } else { text.to_string() };
        let mut tokens = Vec::new();
        for (pos, raw) in normalized.split_whitespace().enumerate() {
            let lower = raw.to_lowercase();
            if !WORD.is_match(&lower) { continue; }
            if self.remove_stopwords && is_stopword(&lower) { continue; }
            tokens.push((self.stemmer.stem(&lower), pos));
        }
        tokens
    }

    pub fn tokenize_document(&self, doc: &Document) -> Vec<TokenOccurrence> {
        self.tokenize(&doc.text)
            .into_iter()
            .map(|(word, position)| TokenOccurrence { doc_id: doc.doc_id.clone(), word, position })
            .collect()
    }

    /// Words of the document names themselves, run through the same pipeline.
    pub fn title_words(&self, docs: &[Document]) -> HashSet<String> {
        docs.iter()
            .flat_map(|d| self.tokenize(&d.doc_id))
            .map(|(w, _)| w)
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self { Self::new(TokenizerConfig::default()) }
}

/// Tokenize with the default configuration (stemming on, stop words kept).
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    DEFAULT_TOKENIZER.tokenize(text)
}
