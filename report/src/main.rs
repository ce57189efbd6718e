mod analysis;

use analysis::{Slice, TokenOptions};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use corpus::records::{load_positioned_words, save_jsonl};
use corpus::{Manifest, PageRange, SegmenterConfig, TfIdfRow};
use std::collections::BTreeSet;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "report")]
#[command(about = "Word counts, TF-IDF rankings and PDF sections for a small corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct TokenArgs {
    /// Remove common English stop words
    #[arg(long, default_value_t = false)]
    stopwords: bool,
    /// Keep words unstemmed
    #[arg(long, default_value_t = false)]
    no_stem: bool,
    /// NFKC-normalize text before filtering (folds ligatures and full-width letters)
    #[arg(long, default_value_t = false)]
    nfkc: bool,
}

impl From<TokenArgs> for TokenOptions {
    fn from(a: TokenArgs) -> Self {
        TokenOptions { stopwords: a.stopwords, no_stem: a.no_stem, nfkc: a.nfkc }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Most frequent words over the whole corpus, or per category
    Counts {
        /// Input path (JSON/JSONL file or directory)
        #[arg(long)]
        input: String,
        /// Source manifest supplying category labels
        #[arg(long)]
        manifest: Option<String>,
        #[arg(long, default_value_t = 20)]
        top: usize,
        /// Count per category instead of corpus-wide
        #[arg(long, default_value_t = false)]
        by_category: bool,
        #[command(flatten)]
        tokens: TokenArgs,
    },
    /// Highest TF-IDF words of every document
    Tfidf {
        /// Input path (JSON/JSONL file or directory)
        #[arg(long)]
        input: String,
        /// Source manifest supplying category labels
        #[arg(long)]
        manifest: Option<String>,
        /// Score only the documents of this category
        #[arg(long)]
        category: Option<String>,
        /// Drop words that occur in any document name
        #[arg(long, default_value_t = false)]
        exclude_title_words: bool,
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Write rows as JSONL instead of printing them
        #[arg(long)]
        output: Option<String>,
        #[command(flatten)]
        tokens: TokenArgs,
    },
    /// Split a PDF's positioned words into heading-delimited sections
    Sections {
        /// Positioned words (JSON array)
        #[arg(long)]
        words: String,
        /// Font height of heading words
        #[arg(long)]
        heading_size: u32,
        /// Ignore pages after this one
        #[arg(long)]
        last_page: Option<u32>,
        /// Largest line gap inside one heading
        #[arg(long, default_value_t = 1)]
        merge_gap: u32,
        /// Rank words across sections by TF-IDF instead of listing section text
        #[arg(long, default_value_t = false)]
        tfidf: bool,
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Category label for the section documents
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        output: Option<String>,
        #[command(flatten)]
        tokens: TokenArgs,
    },
    /// Collapse a PDF's positioned words into one document record
    PdfText {
        /// Positioned words (JSON array)
        #[arg(long)]
        words: String,
        /// Document name
        #[arg(long)]
        name: String,
        /// Manifest to take `use_fonts`, `page_range` and category from
        #[arg(long)]
        manifest: Option<String>,
        /// Font heights to keep, e.g. 9,10
        #[arg(long, value_delimiter = ',')]
        use_fonts: Vec<u32>,
        #[arg(long)]
        first_page: Option<u32>,
        #[arg(long)]
        last_page: Option<u32>,
        /// Write the record as JSONL instead of printing it
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Counts { input, manifest, top, by_category, tokens } => {
            let manifest = load_manifest(manifest.as_deref())?;
            let docs = analysis::read_documents(&input, manifest.as_ref())?;
            let tokenizer = TokenOptions::from(tokens).tokenizer();
            if by_category {
                for row in analysis::category_counts(&docs, &tokenizer, top) {
                    println!("{}\t{}\t{}", row.category, row.word, row.n);
                }
            } else {
                for (word, n) in analysis::word_counts(&docs, &tokenizer, top) {
                    println!("{word}\t{n}");
                }
            }
            Ok(())
        }
        Commands::Tfidf { input, manifest, category, exclude_title_words, top, output, tokens } => {
            let manifest = load_manifest(manifest.as_deref())?;
            let docs = analysis::read_documents(&input, manifest.as_ref())?;
            let tokenizer = TokenOptions::from(tokens).tokenizer();
            let rows = analysis::tfidf_report(&docs, &tokenizer, &Slice { category, exclude_title_words }, top)?;
            emit_rows(&rows, output.as_deref())
        }
        Commands::Sections { words, heading_size, last_page, merge_gap, tfidf, top, category, output, tokens } => {
            let config = SegmenterConfig::new(heading_size).with_last_page(last_page).with_merge_gap(merge_gap);
            let seg = analysis::sections(load_positioned_words(&words)?, &config);
            if tfidf {
                let tokenizer = TokenOptions::from(tokens).tokenizer();
                let rows = analysis::section_tfidf(&seg, &tokenizer, category.as_deref(), top);
                return emit_rows(&rows, output.as_deref());
            }
            match output {
                Some(path) => save_jsonl(&path, &seg.sections),
                None => {
                    for s in &seg.sections {
                        println!("[{}] p{} l{} {}\t{} words", s.heading.id, s.heading.page, s.heading.line, s.heading.text, s.word_count);
                    }
                    Ok(())
                }
            }
        }
        Commands::PdfText { words, name, manifest, use_fonts, first_page, last_page, output } => {
            let manifest = load_manifest(manifest.as_deref())?;
            let descriptor = manifest.as_ref().and_then(|m| m.find(&name));
            let fonts: Option<BTreeSet<u32>> = if use_fonts.is_empty() {
                descriptor.and_then(|d| d.use_fonts.clone())
            } else {
                Some(use_fonts.into_iter().collect())
            };
            let base = descriptor.map(|d| d.page_range).unwrap_or_default();
            let pages = PageRange::new(first_page.unwrap_or(base.first), last_page.or(base.last));
            let category = manifest.as_ref().and_then(|m| m.category_of(&name)).map(str::to_string);
            let record = analysis::pdf_document(load_positioned_words(&words)?, &name, fonts.as_ref(), &pages, category);
            match output {
                Some(path) => save_jsonl(&path, [&record]),
                None => {
                    println!("{}", serde_json::to_string(&record)?);
                    Ok(())
                }
            }
        }
    }
}

fn load_manifest(path: Option<&str>) -> Result<Option<Manifest>> {
    let Some(path) = path else { return Ok(None) };
    let report = Manifest::load(path).with_context(|| format!("loading manifest {path}"))?;
    for err in &report.rejected {
        tracing::warn!(error = %err, "manifest entry skipped");
    }
    Ok(Some(report.manifest))
}

fn emit_rows(rows: &[TfIdfRow], output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            save_jsonl(path, rows)?;
            tracing::info!(path, rows = rows.len(), "tf-idf rows written");
        }
        None => {
            for r in rows {
                println!("{}\t{}\t{}\t{:.4}", r.doc_id, r.word, r.n, r.tf_idf);
            }
        }
    }
    Ok(())
}
