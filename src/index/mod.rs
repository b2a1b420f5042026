// Vector index module
// Built once from every segment, read-only afterward, exact search over all vectors

#[cfg(test)]
mod tests;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::embeddings::Embedder;
use crate::ingest::Segment;
use crate::{QaError, Result};

/// Distance function used to rank segments against a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Euclidean distance
    #[default]
    L2,
    /// One minus cosine similarity
    Cosine,
}

impl DistanceMetric {
    #[inline]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            Self::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (norm_a * norm_b)
                }
            }
        }
    }
}

impl fmt::Display for DistanceMetric {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L2 => f.write_str("l2"),
            Self::Cosine => f.write_str("cosine"),
        }
    }
}

/// A stored vector and the segment it was computed from
#[derive(Debug, Clone)]
struct IndexEntry {
    segment: Segment,
    vector: Vec<f32>,
}

/// One result of a nearest-neighbour search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub segment: &'a Segment,
    pub distance: f32,
}

/// Static nearest-neighbour index
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: usize,
    metric: DistanceMetric,
}

impl VectorIndex {
    /// Embed every segment and build the index.
    ///
    /// Fails without producing an index if any segment cannot be embedded or
    /// the vectors do not all share one dimension.
    #[inline]
    pub fn build(
        segments: Vec<Segment>,
        embedder: &dyn Embedder,
        metric: DistanceMetric,
    ) -> Result<Self> {
        if segments.is_empty() {
            info!("Building empty vector index");
            return Ok(Self {
                entries: Vec::new(),
                dimension: 0,
                metric,
            });
        }

        let bar = if console::user_attended_stderr() {
            ProgressBar::new_spinner().with_style(
                ProgressStyle::with_template("{spinner} Embedding {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            )
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(format!(
            "{} segment(s) with {}",
            segments.len(),
            embedder.model_name()
        ));

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts);
        bar.finish_and_clear();
        let vectors = vectors?;

        if vectors.len() != segments.len() {
            return Err(QaError::Embedding(format!(
                "Expected {} vectors but embedder returned {}",
                segments.len(),
                vectors.len()
            )));
        }

        let dimension = vectors[0].len();
        if dimension == 0 {
            return Err(QaError::Embedding(
                "Embedder returned an empty vector".to_string(),
            ));
        }

        let mut entries = Vec::with_capacity(segments.len());
        for (segment, vector) in segments.into_iter().zip(vectors) {
            if vector.len() != dimension {
                return Err(QaError::Embedding(format!(
                    "Segment {} has dimension {} but index dimension is {}",
                    segment.ordinal,
                    vector.len(),
                    dimension
                )));
            }
            entries.push(IndexEntry { segment, vector });
        }

        info!(
            "Built vector index with {} entries ({} dimensions, {} distance)",
            entries.len(),
            dimension,
            metric
        );

        Ok(Self {
            entries,
            dimension,
            metric,
        })
    }

    /// Return up to `k` segments closest to `query`, nearest first.
    ///
    /// Equal distances keep file order.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension {
            return Err(QaError::Embedding(format!(
                "Query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                segment: &entry.segment,
                distance: self.metric.distance(query, &entry.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.segment.ordinal.cmp(&b.segment.ordinal))
        });
        hits.truncate(k);

        debug!(
            "Search returned {} hits (best distance {:?})",
            hits.len(),
            hits.first().map(|h| h.distance)
        );
        Ok(hits)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimension, zero for an empty index
    #[inline]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub const fn metric(&self) -> DistanceMetric {
        self.metric
    }

    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.entries.iter().map(|entry| &entry.segment)
    }
}
