use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::sentiment::{SentimentClassifier, SentimentLabel};

const POSITIVE: &[&str] = &[
    "amazing", "awesome", "beautiful", "best", "brilliant", "clear", "cool", "enjoy", "enjoyed",
    "excellent", "fantastic", "fun", "good", "great", "happy", "helpful", "incredible",
    "informative", "insightful", "interesting", "legend", "like", "liked", "love", "loved",
    "masterpiece", "nice", "perfect", "recommend", "thank", "thanks", "useful", "valuable",
    "well", "wonderful", "wow",
];

const NEGATIVE: &[&str] = &[
    "annoying", "awful", "bad", "boring", "clickbait", "confusing", "disappointed",
    "disappointing", "dislike", "fake", "hate", "hated", "horrible", "misleading", "mistake",
    "poor", "sad", "scam", "stupid", "terrible", "trash", "ugly", "useless", "waste", "wrong",
    "worse", "worst",
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "hardly", "don't", "dont", "doesn't", "didn't", "isn't",
    "wasn't", "aren't", "can't", "cannot", "won't", "wouldn't", "shouldn't",
];

/// Tokens after a negation whose polarity is flipped.
const NEGATION_SCOPE: usize = 3;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\w']+").expect("token pattern is valid"))
}

/// Word-list polarity scoring with short-range negation.
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    polarity: HashMap<&'static str, i32>,
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        let polarity = POSITIVE
            .iter()
            .map(|w| (*w, 1))
            .chain(NEGATIVE.iter().map(|w| (*w, -1)))
            .collect();
        Self { polarity }
    }
}

impl LexiconClassifier {
    fn score(&self, text: &str) -> i32 {
        let lower = text.to_lowercase().replace('’', "'");
        let mut score = 0;
        let mut negated_for = 0usize;

        for token in token_re().find_iter(&lower).map(|m| m.as_str()) {
            if NEGATIONS.contains(&token) || token.ends_with("n't") {
                negated_for = NEGATION_SCOPE;
                continue;
            }
            if let Some(&value) = self.polarity.get(token) {
                score += if negated_for > 0 { -value } else { value };
            }
            negated_for = negated_for.saturating_sub(1);
        }
        score
    }
}

impl SentimentClassifier for LexiconClassifier {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn classify(&self, text: &str) -> Result<SentimentLabel> {
        Ok(match self.score(text) {
            s if s > 0 => SentimentLabel::Positive,
            s if s < 0 => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        })
    }
}
