use super::estimate_token_count as estimate_token_count_impl;
use super::*;

fn small_config() -> ChunkingConfig {
    ChunkingConfig {
        target_chunk_size: 50,
        max_chunk_size: 100,
        min_chunk_size: 10,
        overlap_size: 0,
        sentence_boundary_splitting: true,
    }
}

#[test]
fn estimate_token_count() {
    assert_eq!(estimate_token_count_impl("hello world"), 2);
    assert_eq!(estimate_token_count_impl("This is a test."), 5);
    assert_eq!(estimate_token_count_impl(""), 0);
}

#[test]
fn blank_text_has_no_chunks() {
    assert!(chunk_text("", &ChunkingConfig::default()).is_empty());
    assert!(chunk_text("  \n\n \t", &ChunkingConfig::default()).is_empty());
}

#[test]
fn small_text_is_single_chunk() {
    let text = "  Refunds are processed within 5 business days.  ";
    let chunks = chunk_text(text, &ChunkingConfig::default());

    assert_eq!(chunks, vec!["Refunds are processed within 5 business days.".to_string()]);
}

#[test]
fn paragraphs_are_split_near_target() {
    let paragraph = "Invoices are issued on the first day of every month. ".repeat(4);
    let text = vec![paragraph.trim(); 6].join("\n\n");
    let config = small_config();

    let chunks = chunk_text(&text, &config);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(
            estimate_token_count_impl(chunk) <= config.max_chunk_size,
            "chunk too large: {chunk}"
        );
    }
}

#[test]
fn oversized_paragraph_splits_on_sentences() {
    let text = "Our warehouse ships orders every weekday morning. ".repeat(40);
    let config = small_config();

    let chunks = chunk_text(&text, &config);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.ends_with('.'), "chunk should end at a sentence: {chunk}");
    }
}

#[test]
fn oversized_paragraph_without_sentence_splitting_uses_words() {
    let text = "word ".repeat(400);
    let config = ChunkingConfig {
        sentence_boundary_splitting: false,
        ..small_config()
    };

    let chunks = chunk_text(&text, &config);

    assert!(chunks.len() > 1);
    let total_words: usize = chunks.iter().map(|c| c.split_whitespace().count()).sum();
    assert_eq!(total_words, 400);
}

#[test]
fn trailing_small_chunk_is_merged() {
    let chunks = vec!["alpha ".repeat(30), "tail words".to_string()];
    let merged = merge_small_chunks(chunks, &small_config());

    assert_eq!(merged.len(), 1);
    assert!(merged[0].ends_with("tail words"));
}

#[test]
fn overlap_carries_previous_tail() {
    let chunks = vec![
        "one two three four five six seven eight nine ten".to_string(),
        "eleven twelve".to_string(),
    ];

    let overlapped = add_overlap(chunks, 4);

    assert_eq!(overlapped[0], "one two three four five six seven eight nine ten");
    // 4 tokens of overlap is 3 words
    assert_eq!(overlapped[1], "eight nine ten\n\neleven twelve");
}

#[test]
fn overlap_skipped_when_previous_is_short() {
    assert_eq!(extract_overlap_text("too short", 50), "");
    assert_eq!(extract_overlap_text("a b c d e", 0), "");
}
