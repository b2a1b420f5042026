// Ingest module
// Reads one local text file and turns it into ordered segments per ChunkingPolicy


pub mod chunking;

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

use crate::{QaError, Result};
pub use chunking::{ChunkingConfig, chunk_text, estimate_token_count};

/// A unit of text extracted from the knowledge file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of this segment within the file, starting at zero
    pub ordinal: usize,
    /// The segment text
    pub text: String,
    /// Path of the file the segment was loaded from
    pub source: String,
}

/// How a loaded file is cut into segments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ChunkingPolicy {
    /// The whole file becomes a single segment
    #[default]
    WholeFile,
    /// Split on paragraph, sentence and word boundaries toward a target size
    Paragraphs(ChunkingConfig),
}

impl ChunkingPolicy {
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::WholeFile => "whole_file",
            Self::Paragraphs(_) => "paragraphs",
        }
    }
}

/// Load a knowledge file and split it into segments
#[inline]
pub fn load_document<P: AsRef<Path>>(path: P, policy: &ChunkingPolicy) -> Result<Vec<Segment>> {
    let path = path.as_ref();
    debug!("Loading knowledge file {}", path.display());

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(QaError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(QaError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let segments = segment_text(&text, &path.display().to_string(), policy);
    info!(
        "Loaded {} segment(s) from {} using {} policy",
        segments.len(),
        path.display(),
        policy.name()
    );
    Ok(segments)
}

/// Split already loaded text into segments
#[inline]
pub fn segment_text(text: &str, source: &str, policy: &ChunkingPolicy) -> Vec<Segment> {
    let pieces = match policy {
        ChunkingPolicy::WholeFile => vec![text.to_string()],
        ChunkingPolicy::Paragraphs(config) => chunk_text(text, config),
    };

    pieces
        .into_iter()
        .enumerate()
        .map(|(ordinal, text)| Segment {
            ordinal,
            text,
            source: source.to_string(),
        })
        .collect()
}
