pub mod llm;
pub mod prompt;
pub mod runner;

use std::sync::OnceLock;

use regex::Regex;

use crate::config::Config;
use crate::error::Result;

/// Length bounds for one summarization call, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryParams {
    pub min_length: usize,
    pub max_length: usize,
    /// Allow non-deterministic decoding. Used on retries.
    pub sample: bool,
}

/// A text-to-text summarizer.
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;
    fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String>;
}

/// Build the LLM summarizer when an endpoint is configured, otherwise the
/// extractive one.
pub fn build_summarizer(config: &Config) -> anyhow::Result<Box<dyn Summarizer>> {
    if config.summarization.endpoint.is_empty() {
        tracing::info!("No summarization endpoint configured, using extractive summaries");
        return Ok(Box::new(ExtractiveSummarizer));
    }
    Ok(Box::new(llm::LlmClient::from_config(&config.summarization)?))
}

/// Picks representative sentences instead of generating text.
#[derive(Debug, Default, Clone)]
pub struct ExtractiveSummarizer;

impl Summarizer for ExtractiveSummarizer {
    fn name(&self) -> &str {
        "extractive"
    }

    fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String> {
        // Roughly 20 words per caption sentence.
        let sentences = (params.max_length / 20).clamp(2, 10);
        Ok(extract_key_sentences(text, sentences))
    }
}

fn sentence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence end pattern is valid"))
}

/// Split after `.`, `!` or `?` followed by whitespace. Pieces keep their
/// punctuation; empty pieces are dropped.
pub fn split_summary_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in sentence_end_re().find_iter(text) {
        out.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    out.push(&text[start..]);
    out.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// First sentence, a stride through the middle half, and the last sentence.
pub fn extract_key_sentences(text: &str, count: usize) -> String {
    let sentences = split_summary_sentences(text);
    if sentences.len() <= count {
        return sentences.join(" ");
    }

    let n = sentences.len();
    let mut key: Vec<&str> = vec![sentences[0]];
    let middle_start = n / 4;
    let middle_end = 3 * n / 4;
    let step = ((middle_end - middle_start) / count.saturating_sub(2).max(1)).max(1);

    for i in (middle_start..middle_end).step_by(step) {
        if key.len() + 1 < count && i < n {
            key.push(sentences[i]);
        }
    }

    let last = sentences[n - 1];
    if !key.contains(&last) {
        key.push(last);
    }
    key.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> String {
        (0..n)
            .map(|i| format!("Sentence number {i} is here."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_split_summary_sentences() {
        assert_eq!(
            split_summary_sentences("One. Two!  Three? four"),
            vec!["One.", "Two!", "Three?", "four"]
        );
        assert!(split_summary_sentences("   ").is_empty());
    }

    #[test]
    fn test_short_text_is_returned_whole() {
        let text = numbered(3);
        assert_eq!(extract_key_sentences(&text, 5), text);
    }

    #[test]
    fn test_key_sentences_take_first_middle_last() {
        let text = numbered(20);
        let summary = extract_key_sentences(&text, 5);
        let picked = split_summary_sentences(&summary);
        assert_eq!(picked.len(), 5);
        assert_eq!(picked[0], "Sentence number 0 is here.");
        assert_eq!(picked[1], "Sentence number 5 is here.");
        assert_eq!(picked[4], "Sentence number 19 is here.");
    }

    #[test]
    fn test_two_sentences_are_first_and_last() {
        let summary = extract_key_sentences(&numbered(10), 2);
        assert_eq!(summary, "Sentence number 0 is here. Sentence number 9 is here.");
    }

    #[test]
    fn test_build_summarizer_defaults_to_extractive() {
        let summarizer = build_summarizer(&Config::default()).unwrap();
        assert_eq!(summarizer.name(), "extractive");
    }
}
