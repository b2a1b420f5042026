// QA module
// QaChain runs retrieve, prompt and generate; QaService adds the blank-query short circuit


use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::Result;
use crate::config::Config;
use crate::embeddings::Embedder;
use crate::generation::Generator;
use crate::index::VectorIndex;
use crate::ingest::Segment;
use crate::prompt::{PromptTemplate, build_context};
use crate::retrieval::{RetrievedSegment, Retriever};

/// Returned instead of an answer when the query is empty or blank
pub const GUIDANCE_MESSAGE: &str = "Please enter a business-related question.";

/// Generated text plus the segments that were placed in the prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<RetrievedSegment>,
}

/// Result of handling one user query
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The query was blank; nothing was retrieved or generated
    Guidance,
    Answer(Answer),
}

impl Response {
    /// The text shown to the user
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            Self::Guidance => GUIDANCE_MESSAGE,
            Self::Answer(answer) => &answer.text,
        }
    }

    /// Segments used to produce the answer, empty for guidance
    #[inline]
    pub fn sources(&self) -> &[RetrievedSegment] {
        match self {
            Self::Guidance => &[],
            Self::Answer(answer) => &answer.sources,
        }
    }
}

/// Retrieval followed by prompt assembly and generation
pub struct QaChain {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    template: PromptTemplate,
}

impl QaChain {
    #[inline]
    pub fn new(retriever: Retriever, generator: Arc<dyn Generator>, template: PromptTemplate) -> Self {
        Self {
            retriever,
            generator,
            template,
        }
    }

    /// Build the prompt that would be sent for `question`
    #[inline]
    pub fn prompt_for(&self, question: &str) -> Result<(String, Vec<RetrievedSegment>)> {
        let sources = self.retriever.retrieve(question)?;
        let context = build_context(&sources);
        Ok((self.template.render(&context, question), sources))
    }

    /// Answer `question` from the indexed knowledge
    #[inline]
    pub fn answer(&self, question: &str) -> Result<Answer> {
        let (prompt, sources) = self.prompt_for(question)?;
        debug!(
            "Sending prompt of {} chars built from {} segment(s)",
            prompt.len(),
            sources.len()
        );
        let text = self.generator.generate(&prompt)?;
        Ok(Answer { text, sources })
    }

    #[inline]
    pub const fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    #[inline]
    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }
}

/// Stateless request handler shared by every caller
pub struct QaService {
    chain: QaChain,
}

impl QaService {
    #[inline]
    pub const fn new(chain: QaChain) -> Self {
        Self { chain }
    }

    /// Embed and index `segments`, then wire the chain using settings from `config`
    #[inline]
    pub fn build(
        segments: Vec<Segment>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: &Config,
    ) -> Result<Self> {
        let template = config
            .prompt_template()
            .map_err(|e| crate::QaError::Config(e.to_string()))?;
        let index = VectorIndex::build(segments, embedder.as_ref(), config.retrieval.metric)?;
        let retriever = Retriever::new(Arc::new(index), embedder, config.retrieval.top_k);

        info!(
            "QA service ready: {} segment(s), embeddings from {}, answers from {}",
            retriever.index().len(),
            retriever.embedder().model_name(),
            generator.model_name()
        );

        Ok(Self::new(QaChain::new(retriever, generator, template)))
    }

    /// Handle one user query
    #[inline]
    pub fn respond(&self, query: &str) -> Result<Response> {
        if query.trim().is_empty() {
            debug!("Blank query, returning guidance");
            return Ok(Response::Guidance);
        }

        self.chain.answer(query).map(Response::Answer)
    }

    #[inline]
    pub const fn chain(&self) -> &QaChain {
        &self.chain
    }
}
