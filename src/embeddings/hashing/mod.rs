
use fxhash::hash64;

use super::{Embedder, l2_normalize};
use crate::{QaError, Result};

pub const DEFAULT_HASHING_DIMENSION: usize = 384;

/// Deterministic bag-of-words embedder that needs no model server.
///
/// Each lower-cased alphanumeric token is hashed into one of `dimension`
/// buckets with a hash-derived sign, and the result is L2-normalised, so
/// texts sharing vocabulary land close together.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    #[inline]
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(QaError::Embedding(
                "Hashing embedder dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    #[inline]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }
}

impl Default for HashingEmbedder {
    #[inline]
    fn default() -> Self {
        Self {
            dimension: DEFAULT_HASHING_DIMENSION,
        }
    }
}

impl Embedder for HashingEmbedder {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0f32; self.dimension];

        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        for token in tokens {
            let h = hash64(token.as_bytes());
            let bucket = (h % self.dimension as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }

    #[inline]
    fn model_name(&self) -> &str {
        "hashing"
    }
}
