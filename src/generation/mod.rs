// Generation module
// Prompt to text backends for answer synthesis

use crate::Result;

/// Maps a fully rendered prompt to generated text
///
/// Every failure is reported as [`crate::QaError::Generation`].
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt`
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Name of the model behind this generator, for logging and status output
    fn model_name(&self) -> &str;
}
