#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for paragraph chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in tokens
    pub target_chunk_size: usize,
    /// Maximum chunk size in tokens before forced splitting
    pub max_chunk_size: usize,
    /// Minimum chunk size in tokens (smaller chunks will be merged)
    pub min_chunk_size: usize,
    /// Overlap size in tokens between adjacent chunks
    pub overlap_size: usize,
    /// Whether to break at sentence boundaries when possible
    pub sentence_boundary_splitting: bool,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            target_chunk_size: 650,
            max_chunk_size: 1000,
            min_chunk_size: 100,
            overlap_size: 50,
            sentence_boundary_splitting: true,
        }
    }
}

/// Chunk plain text into embedding-ready pieces
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let token_count = estimate_token_count(text);
    if token_count <= config.target_chunk_size {
        return vec![text.trim().to_string()];
    }

    let splits = split_by_paragraphs(text, config);
    let merged = merge_small_chunks(splits, config);
    let chunks = if config.overlap_size > 0 {
        add_overlap(merged, config.overlap_size)
    } else {
        merged
    };

    debug!(
        "Chunked {} tokens into {} chunks (avg {} tokens)",
        token_count,
        chunks.len(),
        chunks.iter().map(|c| estimate_token_count(c)).sum::<usize>() / chunks.len().max(1)
    );

    chunks
}

/// Accumulates pieces into a chunk until the target size would be exceeded
struct Accumulator<'a> {
    config: &'a ChunkingConfig,
    splits: Vec<String>,
    current: String,
    current_tokens: usize,
}

impl<'a> Accumulator<'a> {
    const fn new(config: &'a ChunkingConfig) -> Self {
        Self {
            config,
            splits: Vec::new(),
            current: String::new(),
            current_tokens: 0,
        }
    }

    fn push(&mut self, piece: &str, separator: &str) {
        let tokens = estimate_token_count(piece);
        if self.current_tokens + tokens > self.config.target_chunk_size {
            self.flush();
        }
        self.current.push_str(piece);
        self.current.push_str(separator);
        self.current_tokens += tokens;
    }

    fn flush(&mut self) {
        let trimmed = self.current.trim();
        if !trimmed.is_empty() {
            self.splits.push(trimmed.to_string());
        }
        self.current.clear();
        self.current_tokens = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.splits
    }
}

/// Split text on blank lines, breaking oversized paragraphs further
fn split_by_paragraphs(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut acc = Accumulator::new(config);

    for paragraph in text.split("\n\n") {
        if paragraph.trim().is_empty() {
            continue;
        }

        if estimate_token_count(paragraph) > config.max_chunk_size {
            let pieces = if config.sentence_boundary_splitting {
                split_by_sentences(paragraph, config)
            } else {
                split_by_words(paragraph, config)
            };
            for piece in pieces {
                acc.push(&piece, "\n\n");
            }
        } else {
            acc.push(paragraph.trim(), "\n\n");
        }
    }

    acc.finish()
}

/// Split text by sentences
fn split_by_sentences(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut acc = Accumulator::new(config);

    // Simple sentence boundary detection
    let sentences = text
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty());

    for sentence in sentences {
        if estimate_token_count(sentence) > config.max_chunk_size {
            acc.flush();
            acc.splits.extend(split_by_words(sentence, config));
        } else {
            acc.push(sentence, " ");
        }
    }

    acc.finish()
}

/// Split text by words as a last resort
fn split_by_words(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut acc = Accumulator::new(config);
    for word in text.split_whitespace() {
        acc.push(word, " ");
    }
    acc.finish()
}

/// Fold chunks below the minimum size into their predecessor when it fits
fn merge_small_chunks(chunks: Vec<String>, config: &ChunkingConfig) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let tokens = estimate_token_count(&chunk);
        if let Some(previous) = merged.last_mut() {
            if tokens < config.min_chunk_size
                && estimate_token_count(previous) + tokens <= config.max_chunk_size
            {
                previous.push_str("\n\n");
                previous.push_str(&chunk);
                continue;
            }
        }
        merged.push(chunk);
    }

    merged
}

/// Prefix each chunk with the tail of the one before it
fn add_overlap(chunks: Vec<String>, overlap_tokens: usize) -> Vec<String> {
    let mut result = Vec::with_capacity(chunks.len());
    let mut previous: Option<&str> = None;

    for chunk in &chunks {
        let overlap = previous
            .map(|prev| extract_overlap_text(prev, overlap_tokens))
            .unwrap_or_default();
        if overlap.is_empty() {
            result.push(chunk.clone());
        } else {
            result.push(format!("{overlap}\n\n{chunk}"));
        }
        previous = Some(chunk);
    }

    result
}

/// Extract overlap text from the end of a chunk
fn extract_overlap_text(content: &str, overlap_tokens: usize) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    let word_count = (overlap_tokens as f64 * 0.75) as usize; // Rough word-to-token ratio

    if word_count == 0 || words.len() <= word_count {
        return String::new();
    }

    words[words.len() - word_count..].join(" ")
}

/// Estimate token count using a simple heuristic
/// This is a rough approximation - actual tokenization would be more accurate
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words for English text
    // Add extra tokens for punctuation and special characters
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(char::is_ascii_punctuation).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}
