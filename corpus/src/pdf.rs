//! Section extraction from positioned PDF words.
//!
//! Headings are recognised purely by font height: every word whose `height`
//! equals [`SegmenterConfig::heading_size`] is a heading candidate, and
//! candidates on the same or adjacent lines merge into one heading. Body words
//! then belong to the latest heading that started at or before their line.
//!
//! ```text
//! PositionedWord[] -> LinedWord[] -> Heading[] -> Section[] -> Document[]
//!                    assign_line_numbers   segment      sections_to_documents
//! ```

use crate::model::Document;
use crate::source::PageRange;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// A word as laid out on a page by an external extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedWord {
    pub page: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub text: String,
    #[serde(rename = "space", alias = "has_trailing_space", default)]
    pub has_trailing_space: bool,
}

/// A positioned word with its document-global line number (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinedWord {
    pub line: u32,
    pub word: PositionedWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterConfig {
    /// Font height that marks a heading word.
    pub heading_size: u32,
    /// Words on later pages are discarded before sectioning. `None` keeps all pages.
    pub last_page: Option<u32>,
    /// Largest line-number gap between heading words that still continues a heading.
    pub merge_gap: u32,
}

impl SegmenterConfig {
    pub fn new(heading_size: u32) -> Self {
        Self { heading_size, last_page: None, merge_gap: 1 }
    }

    pub fn with_last_page(mut self, last_page: Option<u32>) -> Self {
        self.last_page = last_page;
        self
    }

    pub fn with_merge_gap(mut self, merge_gap: u32) -> Self {
        self.merge_gap = merge_gap;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub id: usize,
    pub page: u32,
    pub line: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: Heading,
    pub text: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    pub headings: Vec<Heading>,
    pub sections: Vec<Section>,
    /// Body words seen before the first heading.
    pub dropped: usize,
}

impl Segmentation {
    pub fn is_empty(&self) -> bool { self.sections.is_empty() }
}

/// Number lines by sorting the distinct (page, y) pairs.
pub fn assign_line_numbers(words: Vec<PositionedWord>) -> Vec<LinedWord> {
    let mut keys: Vec<(u32, i32)> = words.iter().map(|w| (w.page, w.y)).collect();
    keys.sort_unstable();
    keys.dedup();
    words
        .into_iter()
        .map(|word| {
            let key = (word.page, word.y);
            let line = keys.partition_point(|k| *k < key) as u32 + 1;
            LinedWord { line, word }
        })
        .collect()
}

/// Keep words whose height is in `use_fonts` (all heights when `None`) and
/// whose page falls inside `pages`.
pub fn filter_words(
    words: Vec<PositionedWord>,
    use_fonts: Option<&BTreeSet<u32>>,
    pages: &PageRange,
) -> Vec<PositionedWord> {
    words
        .into_iter()
        .filter(|w| pages.contains(w.page))
        .filter(|w| use_fonts.map_or(true, |fonts| fonts.contains(&w.height)))
        .collect()
}

/// Space-joined word texts.
pub fn words_to_text<'a, I>(words: I) -> String
where
    I: IntoIterator<Item = &'a PositionedWord>,
{
    words.into_iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
}

pub fn segment(words: Vec<PositionedWord>, config: &SegmenterConfig) -> Segmentation {
    segment_lines(assign_line_numbers(words), config)
}

/// Section already line-numbered words.
pub fn segment_lines(mut words: Vec<LinedWord>, config: &SegmenterConfig) -> Segmentation {
    if let Some(last) = config.last_page {
        words.retain(|w| w.word.page <= last);
    }
    // reading order: line, then left to right
    words.sort_by_key(|w| (w.line, w.word.x));

    let headings = extract_headings(&words, config);
    if headings.is_empty() {
        tracing::debug!(heading_size = config.heading_size, "no words at heading size, no sections");
        return Segmentation::default();
    }

    let mut bodies: Vec<Vec<&str>> = vec![Vec::new(); headings.len()];
    // number of headings started at or before the current word
    let mut started = 0usize;
    let mut dropped = 0usize;
    for w in words.iter().filter(|w| w.word.height != config.heading_size) {
        while started < headings.len() && headings[started].line <= w.line {
            started += 1;
        }
        match started.checked_sub(1) {
            Some(i) => bodies[i].push(w.word.text.as_str()),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(dropped, "body words before the first heading dropped");
    }

    let sections = headings
        .iter()
        .zip(bodies)
        .map(|(heading, body)| Section {
            heading: heading.clone(),
            word_count: body.len(),
            text: body.join(" "),
        })
        .collect();
    Segmentation { headings, sections, dropped }
}

/// Merge heading-height words into headings. `words` must be in reading order.
pub fn extract_headings(words: &[LinedWord], config: &SegmenterConfig) -> Vec<Heading> {
    let mut headings: Vec<Heading> = Vec::new();
    let mut last_line: Option<u32> = None;
    for w in words.iter().filter(|w| w.word.height == config.heading_size) {
        let continues = last_line.map_or(false, |prev| w.line.saturating_sub(prev) <= config.merge_gap);
        last_line = Some(w.line);
        if continues {
            if let Some(heading) = headings.last_mut() {
                heading.text.push(' ');
                heading.text.push_str(&w.word.text);
                continue;
            }
        }
        headings.push(Heading {
            id: headings.len(),
            page: w.word.page,
            line: w.line,
            text: w.word.text.clone(),
        });
    }
    headings
}

/// One document per section, named after its heading. A heading text that has
/// already been used gets ` #<id>` appended.
pub fn sections_to_documents(sections: &[Section], category: Option<&str>) -> Vec<Document> {
    let mut used: HashSet<String> = HashSet::new();
    sections
        .iter()
        .map(|s| {
            let mut name = s.heading.text.clone();
            if !used.insert(name.clone()) {
                name = format!("{} #{}", s.heading.text, s.heading.id);
                used.insert(name.clone());
            }
            let doc = Document::new(name, s.text.clone());
            match category {
                Some(c) => doc.with_category(c),
                None => doc,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: u32 = 17;
    const BODY: u32 = 10;

    fn word(page: u32, x: i32, y: i32, height: u32, text: &str) -> PositionedWord {
        PositionedWord { page, x, y, width: 10, height, text: text.to_string(), has_trailing_space: true }
    }

    fn lined(line: u32, x: i32, height: u32, text: &str) -> LinedWord {
        LinedWord { line, word: word(1, x, line as i32 * 10, height, text) }
    }

    fn heading_lines(seg: &Segmentation) -> Vec<u32> {
        seg.headings.iter().map(|h| h.line).collect()
    }

    #[test]
    fn line_numbers_follow_page_then_y() {
        let words = vec![
            word(2, 0, 5, BODY, "c"),
            word(1, 0, 30, BODY, "b"),
            word(1, 50, 30, BODY, "b2"),
            word(1, 0, 10, BODY, "a"),
        ];
        let lines: Vec<(String, u32)> =
            assign_line_numbers(words).into_iter().map(|l| (l.word.text, l.line)).collect();
        assert_eq!(
            lines,
            vec![("c".into(), 3), ("b".into(), 2), ("b2".into(), 2), ("a".into(), 1)]
        );
    }

    #[test]
    fn distant_heading_words_form_separate_headings() {
        let words = vec![lined(38, 0, H, "One"), lined(751, 0, H, "Two"), lined(1322, 0, H, "Three")];
        let seg = segment_lines(words, &SegmenterConfig::new(H));
        assert_eq!(heading_lines(&seg), vec![38, 751, 1322]);
        assert_eq!(seg.headings.iter().map(|h| h.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn adjacent_heading_lines_merge() {
        let words = vec![
            lined(38, 0, H, "Terms"),
            lined(38, 40, H, "of"),
            lined(39, 0, H, "Service"),
            lined(751, 0, H, "Privacy"),
        ];
        let seg = segment_lines(words, &SegmenterConfig::new(H));
        assert_eq!(heading_lines(&seg), vec![38, 751]);
        assert_eq!(seg.headings[0].text, "Terms of Service");
        assert_eq!(seg.headings[1].text, "Privacy");
    }

    #[test]
    fn wider_merge_gap() {
        let words = vec![lined(38, 0, H, "A"), lined(40, 0, H, "B")];
        assert_eq!(segment_lines(words.clone(), &SegmenterConfig::new(H)).headings.len(), 2);
        let seg = segment_lines(words, &SegmenterConfig::new(H).with_merge_gap(2));
        assert_eq!(seg.headings.len(), 1);
        assert_eq!(seg.headings[0].text, "A B");
    }

    #[test]
    fn body_words_forward_fill() {
        let words = vec![
            lined(5, 0, BODY, "preamble"),
            lined(10, 0, H, "First"),
            lined(10, 80, BODY, "inline"),
            lined(11, 0, BODY, "alpha"),
            lined(49, 0, BODY, "beta"),
            lined(50, 0, H, "Second"),
            lined(51, 0, BODY, "gamma"),
        ];
        let seg = segment_lines(words, &SegmenterConfig::new(H));
        assert_eq!(seg.dropped, 1);
        assert_eq!(seg.sections.len(), 2);
        assert_eq!(seg.sections[0].text, "inline alpha beta");
        assert_eq!(seg.sections[0].word_count, 3);
        assert_eq!(seg.sections[1].text, "gamma");
    }

    #[test]
    fn body_word_left_of_heading_on_its_line_belongs_to_it() {
        let words = vec![lined(1, 0, H, "Top"), lined(20, 0, BODY, "left"), lined(20, 50, H, "Next")];
        let seg = segment_lines(words, &SegmenterConfig::new(H));
        assert_eq!(seg.sections[0].text, "");
        assert_eq!(seg.sections[1].text, "left");
    }

    #[test]
    fn no_heading_words_means_no_sections() {
        let words = vec![lined(1, 0, BODY, "just"), lined(2, 0, BODY, "text")];
        let seg = segment_lines(words, &SegmenterConfig::new(H));
        assert!(seg.is_empty());
        assert!(seg.headings.is_empty());
    }

    #[test]
    fn single_word_heading() {
        let words = vec![lined(1, 0, BODY, "body"), lined(1, 30, H, "X"), lined(2, 0, BODY, "after")];
        let seg = segment_lines(words, &SegmenterConfig::new(H));
        assert_eq!(seg.headings[0].text, "X");
        assert_eq!(seg.sections[0].text, "body after");
        assert_eq!(seg.dropped, 0);
    }

    #[test]
    fn last_page_cuts_off_before_fill() {
        let words = vec![
            word(1, 0, 10, H, "Intro"),
            word(1, 0, 20, BODY, "kept"),
            word(2, 0, 10, BODY, "also"),
            word(3, 0, 10, H, "Appendix"),
            word(3, 0, 20, BODY, "gone"),
        ];
        let all = segment(words.clone(), &SegmenterConfig::new(H));
        assert_eq!(all.sections.len(), 2);

        let cut = segment(words, &SegmenterConfig::new(H).with_last_page(Some(2)));
        assert_eq!(cut.sections.len(), 1);
        assert_eq!(cut.sections[0].text, "kept also");
    }

    #[test]
    fn filter_by_font_and_page() {
        let words = vec![
            word(1, 0, 0, 9, "small"),
            word(1, 0, 10, 10, "body"),
            word(5, 0, 0, 10, "late"),
        ];
        let fonts: BTreeSet<u32> = [10].into_iter().collect();
        let kept = filter_words(words.clone(), Some(&fonts), &PageRange::new(1, Some(4)));
        assert_eq!(words_to_text(&kept), "body");
        let kept = filter_words(words, None, &PageRange::default());
        assert_eq!(words_to_text(&kept), "small body late");
    }

    #[test]
    fn section_documents_get_unique_names() {
        let words = vec![
            lined(1, 0, H, "Terms"),
            lined(2, 0, BODY, "a"),
            lined(9, 0, H, "Terms"),
            lined(10, 0, BODY, "b"),
        ];
        let seg = segment_lines(words, &SegmenterConfig::new(H));
        let docs = sections_to_documents(&seg.sections, Some("legal"));
        assert_eq!(docs[0].doc_id, "Terms");
        assert_eq!(docs[1].doc_id, "Terms #1");
        assert_eq!(docs[1].text, "b");
        assert_eq!(docs[1].category.as_deref(), Some("legal"));
    }
}
