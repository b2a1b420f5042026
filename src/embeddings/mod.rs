// Embeddings module
// Text to vector backends used for both index build and query time

pub mod hashing;

pub use hashing::HashingEmbedder;

use crate::Result;

/// Maps text to a fixed-dimension vector
///
/// Every failure is reported as [`crate::QaError::Embedding`].
pub trait Embedder: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning one vector per input in the same order
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Name of the model behind this embedder, for logging and status output
    fn model_name(&self) -> &str;
}

/// Scale a vector to unit length in place; zero vectors are left untouched
#[inline]
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}
