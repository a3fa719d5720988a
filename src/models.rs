use std::sync::Arc;

use crate::config::Config;
use crate::nlp::embedding::{build_embedder, Embedder};
use crate::nlp::sentences::{RuleTokenizer, SentenceTokenizer};
use crate::nlp::tagger::{LexiconTagger, PosTagger};
use crate::nlp::tfidf::TfIdfEmbedder;
use crate::timestamps::keywords::KeywordExtractor;

/// The language models shared by every pipeline run.
///
/// Built once at startup and passed by reference. Whether a POS tagger is
/// available is decided here, not at each call.
pub struct ModelRegistry {
    tokenizer: Box<dyn SentenceTokenizer>,
    embedder: Box<dyn Embedder>,
    tagger: Option<Arc<dyn PosTagger>>,
    keywords: KeywordExtractor,
}

impl ModelRegistry {
    pub fn new(
        tokenizer: Box<dyn SentenceTokenizer>,
        embedder: Box<dyn Embedder>,
        tagger: Option<Arc<dyn PosTagger>>,
    ) -> Self {
        let keywords = KeywordExtractor::new(tagger.clone());
        Self {
            tokenizer,
            embedder,
            tagger,
            keywords,
        }
    }

    /// Rule tokenizer, TF-IDF embeddings and the lexicon tagger. Needs no
    /// network access.
    pub fn local() -> Self {
        Self::new(
            Box::new(RuleTokenizer::default()),
            Box::new(TfIdfEmbedder),
            Some(Arc::new(LexiconTagger)),
        )
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let embedder = build_embedder(&config.embeddings)?;
        let tagger: Option<Arc<dyn PosTagger>> = if config.tagger.enabled {
            Some(Arc::new(LexiconTagger))
        } else {
            None
        };
        tracing::info!(
            "Models: tokenizer=rule, embedder={}, tagger={}",
            embedder.name(),
            tagger.as_ref().map_or("none", |t| t.name())
        );
        Ok(Self::new(
            Box::new(RuleTokenizer::default()),
            embedder,
            tagger,
        ))
    }

    /// Replace the keyword strategy chain.
    pub fn with_keywords(mut self, keywords: KeywordExtractor) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn tokenizer(&self) -> &dyn SentenceTokenizer {
        self.tokenizer.as_ref()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn tagger(&self) -> Option<&dyn PosTagger> {
        self.tagger.as_deref()
    }

    pub fn keywords(&self) -> &KeywordExtractor {
        &self.keywords
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("tokenizer", &self.tokenizer.name())
            .field("embedder", &self.embedder.name())
            .field("tagger", &self.tagger.as_ref().map(|t| t.name()))
            .field("keywords", &self.keywords)
            .finish()
    }
}
