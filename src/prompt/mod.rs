
use itertools::Itertools;

use crate::retrieval::RetrievedSegment;
use crate::{QaError, Result};

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Built-in template used when the configuration does not provide one
pub const DEFAULT_TEMPLATE: &str = "
You are a helpful business consultant. Use the following context to answer the question.

Context:
{context}

Question:
{question}

Answer clearly and professionally:
";

/// Fixed text skeleton with `{context}` and `{question}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template, checking that both placeholders are present
    #[inline]
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(QaError::Config(format!(
                    "Prompt template is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute context and question into the template.
    ///
    /// Substituted text is never re-scanned, so a question containing
    /// `{context}` stays literal.
    #[inline]
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut output = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        loop {
            let next_context = rest.find(CONTEXT_PLACEHOLDER);
            let next_question = rest.find(QUESTION_PLACEHOLDER);

            let (position, placeholder, value) = match (next_context, next_question) {
                (Some(c), Some(q)) if c < q => (c, CONTEXT_PLACEHOLDER, context),
                (Some(c), None) => (c, CONTEXT_PLACEHOLDER, context),
                (_, Some(q)) => (q, QUESTION_PLACEHOLDER, question),
                (None, None) => break,
            };

            output.push_str(&rest[..position]);
            output.push_str(value);
            rest = &rest[position + placeholder.len()..];
        }

        output.push_str(rest);
        output
    }
}

impl Default for PromptTemplate {
    #[inline]
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// Join retrieved segments, in retrieval order, into one context block
#[inline]
pub fn build_context(segments: &[RetrievedSegment]) -> String {
    segments
        .iter()
        .map(|retrieved| retrieved.segment.text.as_str())
        .join("\n\n")
}
