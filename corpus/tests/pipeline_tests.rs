use corpus::pdf::{segment, sections_to_documents};
use corpus::tfidf::{compute_tfidf, corpus_tfidf, top_n_per_doc};
use corpus::{Corpus, Document, PositionedWord, SegmenterConfig, TermCount, Tokenizer, TokenizerConfig};
use std::collections::HashMap;

fn plain() -> Tokenizer {
    Tokenizer::new(TokenizerConfig { stem: false, ..Default::default() })
}

fn pets() -> Vec<Document> {
    vec![
        Document::new("Dog", "The dog barks at the mailman and the dog sleeps all night").with_category("pets"),
        Document::new("Cat", "the cat sleeps all day and the cat purrs").with_category("pets"),
        Document::new("Shark", "the shark swims in the sea 24 hours a day").with_category("fish"),
        Document::new("Empty", "1234 ... !!!"),
    ]
}

#[test]
fn cat_sat_round_trip() {
    let docs = vec![Document::new("doc1", "the cat sat"), Document::new("doc2", "the dog sat")];
    let corpus = Corpus::build(&docs, &plain());
    let counts = corpus.term_counts();
    assert_eq!(counts.len(), 6);
    assert!(counts.iter().all(|c| c.n == 1));

    let rows = corpus_tfidf(&corpus);
    let get = |doc: &str, word: &str| rows.iter().find(|r| r.doc_id == doc && r.word == word).unwrap().clone();
    assert_eq!(get("doc1", "the").idf, 0.0);
    assert!((get("doc1", "cat").idf - 0.693).abs() < 1e-3);
    assert!((get("doc1", "cat").tf_idf - 0.231).abs() < 1e-3);
}

#[test]
fn tf_sums_to_one_and_scores_are_bounded() {
    let corpus = Corpus::build(&pets(), &Tokenizer::default());
    let rows = corpus_tfidf(&corpus);
    let num_docs = 3.0f64; // Empty has no tokens

    let mut tf_sums: HashMap<&str, f64> = HashMap::new();
    for r in &rows {
        *tf_sums.entry(r.doc_id.as_str()).or_insert(0.0) += r.tf;
        assert!(r.tf_idf >= 0.0);
        assert!(r.idf >= 0.0 && r.idf <= num_docs.ln() + 1e-12);
    }
    assert_eq!(tf_sums.len(), 3);
    for (_, sum) in tf_sums {
        assert!((sum - 1.0).abs() < 1e-9);
    }

    let the = rows.iter().find(|r| r.word == "the").unwrap();
    assert_eq!(the.idf, 0.0);
    let shark = rows.iter().find(|r| r.word == "shark").unwrap();
    assert_eq!(shark.idf, num_docs.ln());
}

#[test]
fn idf_is_strictly_decreasing_in_document_frequency() {
    let rows = vec![
        TermCount::new("A", "one", 1),
        TermCount::new("A", "two", 1),
        TermCount::new("B", "two", 1),
        TermCount::new("A", "three", 1),
        TermCount::new("B", "three", 1),
        TermCount::new("C", "three", 1),
        TermCount::new("D", "pad", 1),
    ];
    let out = compute_tfidf(&rows);
    let idf = |w: &str| out.iter().find(|r| r.word == w).unwrap().idf;
    assert!(idf("one") > idf("two"));
    assert!(idf("two") > idf("three"));
    assert!(idf("three") > 0.0);
}

#[test]
fn category_subset_recomputes_idf() {
    let corpus = Corpus::build(&pets(), &plain());
    let full = corpus_tfidf(&corpus);
    let pets_only = corpus_tfidf(&corpus.in_category("pets"));

    let sleeps_full = full.iter().find(|r| r.doc_id == "Dog" && r.word == "sleeps").unwrap();
    let sleeps_pets = pets_only.iter().find(|r| r.doc_id == "Dog" && r.word == "sleeps").unwrap();
    assert!(sleeps_full.idf > 0.0);
    assert_eq!(sleeps_pets.idf, 0.0);
    assert!(pets_only.iter().all(|r| r.doc_id != "Shark"));
}

#[test]
fn title_words_can_be_removed() {
    let docs = pets();
    let t = plain();
    let corpus = Corpus::build(&docs, &t).without_words(&t.title_words(&docs));
    let top = top_n_per_doc(&corpus_tfidf(&corpus), 1);
    assert!(top.iter().all(|r| !["dog", "cat", "shark", "empty"].contains(&r.word.as_str())));
    assert_eq!(top.len(), 3);
}

#[test]
fn pdf_sections_feed_tfidf() {
    let w = |page: u32, y: i32, x: i32, height: u32, text: &str| PositionedWord {
        page,
        x,
        y,
        width: 10,
        height,
        text: text.to_string(),
        has_trailing_space: true,
    };
    let words = vec![
        w(1, 10, 0, 12, "Contract"),
        w(1, 20, 0, 17, "Payment"),
        w(1, 30, 0, 10, "the buyer pays the seller"),
        w(1, 40, 0, 17, "Delivery"),
        w(2, 10, 0, 10, "the seller ships goods"),
    ];
    let seg = segment(words, &SegmenterConfig::new(17));
    assert_eq!(seg.dropped, 1);
    let docs = sections_to_documents(&seg.sections, None);
    assert_eq!(docs.iter().map(|d| d.doc_id.as_str()).collect::<Vec<_>>(), vec!["Payment", "Delivery"]);

    let rows = corpus_tfidf(&Corpus::build(&docs, &plain()));
    let seller = rows.iter().find(|r| r.doc_id == "Payment" && r.word == "seller").unwrap();
    assert_eq!(seller.idf, 0.0);
    let buyer = rows.iter().find(|r| r.word == "buyer").unwrap();
    assert!(buyer.tf_idf > 0.0);
}
