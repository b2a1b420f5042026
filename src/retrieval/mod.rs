
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::Result;
use crate::embeddings::Embedder;
use crate::index::VectorIndex;
use crate::ingest::Segment;

pub const DEFAULT_TOP_K: usize = 3;

/// A segment returned for a query, with its distance from the query vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedSegment {
    pub segment: Segment,
    pub distance: f32,
}

/// Embeds queries with the same embedder used for the index and looks up
/// the nearest segments
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    #[inline]
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    /// Return the `top_k` segments nearest to `query`, most similar first
    #[inline]
    pub fn retrieve(&self, query: &str) -> Result<Vec<RetrievedSegment>> {
        if self.index.is_empty() {
            debug!("Index is empty, nothing to retrieve");
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query)?;
        let hits = self.index.search(&query_vector, self.top_k)?;

        debug!(
            "Retrieved {} segment(s) for query of length {}",
            hits.len(),
            query.len()
        );

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedSegment {
                segment: hit.segment.clone(),
                distance: hit.distance,
            })
            .collect())
    }

    #[inline]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[inline]
    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }
}
