use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::nlp::{rank_by_frequency, truncate_chars};
use crate::nlp::stopwords::KEYWORD_STOP_WORDS;
use crate::nlp::tagger::{PosTag, PosTagger};

/// Titles longer than this are cut to `TITLE_MAX_CHARS - 3` chars plus "...".
pub const TITLE_MAX_CHARS: usize = 50;

/// Which strategy produced a keyword list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMethod {
    Tagged,
    Frequency,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordOutcome {
    pub keywords: Vec<String>,
    pub method: KeywordMethod,
}

/// One way of picking the `n` most salient terms of a text.
pub trait KeywordStrategy: Send + Sync {
    fn method(&self) -> KeywordMethod;
    fn extract(&self, text: &str, n: usize) -> Result<Vec<String>>;
}

/// Frequent nouns and proper nouns, backfilled with frequent verbs.
pub struct TaggedKeywords {
    tagger: Arc<dyn PosTagger>,
}

impl TaggedKeywords {
    pub fn new(tagger: Arc<dyn PosTagger>) -> Self {
        Self { tagger }
    }
}

impl KeywordStrategy for TaggedKeywords {
    fn method(&self) -> KeywordMethod {
        KeywordMethod::Tagged
    }

    fn extract(&self, text: &str, n: usize) -> Result<Vec<String>> {
        let tokens = self.tagger.tag(text)?;
        let salient = |want: fn(PosTag) -> bool| {
            tokens
                .iter()
                .filter(|t| want(t.pos) && !t.is_stop && t.text.chars().count() > 3)
                .map(|t| t.text.to_lowercase())
                .collect::<Vec<_>>()
        };

        let mut keywords = rank_by_frequency(salient(PosTag::is_nominal), n);
        if keywords.len() < n {
            let verbs = salient(|p| p == PosTag::Verb);
            for verb in rank_by_frequency(verbs, n) {
                if keywords.len() >= n {
                    break;
                }
                if !keywords.contains(&verb) {
                    keywords.push(verb);
                }
            }
        }
        keywords.truncate(n);
        Ok(keywords)
    }
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w+\b").expect("word pattern is valid"))
}

/// Plain word frequency over a fixed stop list.
#[derive(Debug, Default, Clone)]
pub struct FrequencyKeywords;

impl KeywordStrategy for FrequencyKeywords {
    fn method(&self) -> KeywordMethod {
        KeywordMethod::Frequency
    }

    fn extract(&self, text: &str, n: usize) -> Result<Vec<String>> {
        let lower = text.to_lowercase();
        let words = word_re()
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|w| w.chars().count() > 3 && !KEYWORD_STOP_WORDS.contains(w))
            .map(str::to_string);
        Ok(rank_by_frequency(words, n))
    }
}

/// Ranked keyword strategies, tried in order until one succeeds.
pub struct KeywordExtractor {
    strategies: Vec<Box<dyn KeywordStrategy>>,
}

impl KeywordExtractor {
    /// Tagged extraction first when a tagger is available, then frequency.
    pub fn new(tagger: Option<Arc<dyn PosTagger>>) -> Self {
        let mut strategies: Vec<Box<dyn KeywordStrategy>> = Vec::new();
        if let Some(tagger) = tagger {
            strategies.push(Box::new(TaggedKeywords::new(tagger)));
        }
        strategies.push(Box::new(FrequencyKeywords));
        Self { strategies }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn KeywordStrategy>>) -> Self {
        Self { strategies }
    }

    /// Never fails: when every strategy errors, returns `min(n, 3)`
    /// placeholder keywords.
    pub fn extract(&self, text: &str, n: usize) -> KeywordOutcome {
        for strategy in &self.strategies {
            match strategy.extract(text, n) {
                Ok(keywords) => {
                    return KeywordOutcome {
                        keywords,
                        method: strategy.method(),
                    }
                }
                Err(e) => {
                    tracing::warn!("{:?} keyword extraction failed: {}", strategy.method(), e);
                }
            }
        }

        KeywordOutcome {
            keywords: vec!["keyword".to_string(); n.min(3)],
            method: KeywordMethod::Placeholder,
        }
    }
}

impl std::fmt::Debug for KeywordExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let methods: Vec<KeywordMethod> = self.strategies.iter().map(|s| s.method()).collect();
        f.debug_struct("KeywordExtractor")
            .field("strategies", &methods)
            .finish()
    }
}

/// Cut a sentence down to a segment title.
pub fn make_title(sentence: &str) -> String {
    truncate_chars(sentence.trim(), TITLE_MAX_CHARS)
}
