use crate::model::Document;
use crate::pdf::PositionedWord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One fetched document as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<String>,
}

impl DocRecord {
    /// Convert to a `Document`; a label in `categories` replaces the record's own.
    pub fn into_document(self, categories: &HashMap<String, String>) -> Document {
        let category = categories.get(&self.name).cloned().or(self.category);
        Document { doc_id: self.name, category, text: self.text }
    }
}

/// Load document records from a `.json` file (array or single object), a
/// `.jsonl` file, or a directory searched recursively for both.
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<DocRecord>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else {
        files.push(path.to_path_buf());
    }

    let mut records = Vec::new();
    for file in files {
        if extension(&file) == Some("jsonl") {
            read_jsonl(&file, &mut records)?;
        } else {
            read_json(&file, &mut records)?;
        }
    }
    tracing::debug!(path = %path.display(), count = records.len(), "loaded documents");
    Ok(records)
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path, out: &mut Vec<DocRecord>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: DocRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        out.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<DocRecord>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => out.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "ignoring JSON that is neither object nor array"),
    }
    Ok(())
}

/// Load a JSON array of positioned words.
pub fn load_positioned_words<P: AsRef<Path>>(path: P) -> Result<Vec<PositionedWord>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let words: Vec<PositionedWord> = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing positioned words in {}", path.display()))?;
    Ok(words)
}

/// Write one JSON value per line.
pub fn write_jsonl<W, T, I>(writer: &mut W, items: I) -> Result<()>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    for item in items {
        serde_json::to_writer(&mut *writer, &item)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

pub fn save_jsonl<P, T, I>(path: P, items: I) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    let mut out = BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
    write_jsonl(&mut out, items)?;
    out.flush()?;
    Ok(())
}
