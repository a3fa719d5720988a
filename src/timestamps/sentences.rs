use serde::Serialize;

use crate::nlp::sentences::{split_on_punctuation, SentenceTokenizer};
use crate::transcript::TranscriptFragment;

/// Maps byte offsets in the concatenated transcript back to the start time
/// of the fragment that produced them.
#[derive(Debug, Clone, Default)]
pub struct TimeMapping {
    /// Byte offset where each fragment's text begins, ascending.
    offsets: Vec<usize>,
    times: Vec<f64>,
    len: usize,
}

impl TimeMapping {
    /// Concatenate fragment texts, each followed by one space, and record
    /// where each fragment starts.
    pub fn build(fragments: &[TranscriptFragment]) -> (String, Self) {
        let mut text = String::new();
        let mut mapping = Self::default();
        for fragment in fragments {
            mapping.offsets.push(text.len());
            mapping.times.push(fragment.start);
            text.push_str(&fragment.text);
            text.push(' ');
        }
        mapping.len = text.len();
        (text, mapping)
    }

    /// Start time of the fragment covering `offset`, or `None` past the end.
    pub fn lookup(&self, offset: usize) -> Option<f64> {
        if offset >= self.len {
            return None;
        }
        // Last fragment starting at or before the offset. Empty fragments
        // share an offset with their successor; the later one wins.
        let idx = self.offsets.partition_point(|&o| o <= offset);
        idx.checked_sub(1).map(|i| self.times[i])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    pub text: String,
    /// Start time of the sentence's first word.
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerUsed {
    Primary,
    PunctuationFallback,
}

#[derive(Debug, Clone)]
pub struct SentenceSplit {
    pub sentences: Vec<Sentence>,
    pub mapping: TimeMapping,
    pub tokenizer: TokenizerUsed,
}

impl SentenceSplit {
    pub fn texts(&self) -> Vec<String> {
        self.sentences.iter().map(|s| s.text.clone()).collect()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.sentences.iter().map(|s| s.timestamp).collect()
    }
}

/// Split the transcript into sentences and time-stamp each one.
///
/// Each sentence is located by its first occurrence in the concatenated
/// text, so a sentence that repeats word for word gets the time of its
/// earliest occurrence. A sentence that cannot be located inherits the
/// previous sentence's time.
pub fn split_sentences(
    fragments: &[TranscriptFragment],
    tokenizer: &dyn SentenceTokenizer,
) -> SentenceSplit {
    let (text, mapping) = TimeMapping::build(fragments);

    let (raw, used) = match tokenizer.split(&text) {
        Ok(raw) => (raw, TokenizerUsed::Primary),
        Err(e) => {
            tracing::warn!(
                "{} tokenizer failed ({}), splitting on punctuation",
                tokenizer.name(),
                e
            );
            (split_on_punctuation(&text), TokenizerUsed::PunctuationFallback)
        }
    };

    let mut sentences: Vec<Sentence> = Vec::with_capacity(raw.len());
    for sentence in raw {
        let located = text.find(sentence.as_str()).and_then(|pos| mapping.lookup(pos));
        let timestamp = located
            .or_else(|| sentences.last().map(|s| s.timestamp))
            .unwrap_or(0.0);
        sentences.push(Sentence {
            text: sentence,
            timestamp,
        });
    }

    tracing::info!(
        "Tokenized transcript into {} sentences ({:?})",
        sentences.len(),
        used
    );

    SentenceSplit {
        sentences,
        mapping,
        tokenizer: used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DigestError, Result};
    use crate::nlp::sentences::RuleTokenizer;

    struct BrokenTokenizer;

    impl SentenceTokenizer for BrokenTokenizer {
        fn name(&self) -> &str {
            "broken"
        }

        fn split(&self, _text: &str) -> Result<Vec<String>> {
            Err(DigestError::Tokenization("model missing".to_string()))
        }
    }

    /// Returns a sentence that never occurs in the text.
    struct InventingTokenizer;

    impl SentenceTokenizer for InventingTokenizer {
        fn name(&self) -> &str {
            "inventing"
        }

        fn split(&self, text: &str) -> Result<Vec<String>> {
            let mut out = RuleTokenizer::default().split(text)?;
            out.insert(1, "Never said this.".to_string());
            Ok(out)
        }
    }

    fn fragments() -> Vec<TranscriptFragment> {
        vec![
            TranscriptFragment::new("Hello world. This", 0.0, 2.0),
            TranscriptFragment::new("spans fragments.", 2.5, 2.0),
            TranscriptFragment::new("Last one here.", 7.0, 2.0),
        ]
    }

    #[test]
    fn test_build_mapping() {
        let (text, mapping) = TimeMapping::build(&fragments());
        assert_eq!(text, "Hello world. This spans fragments. Last one here. ");
        assert_eq!(mapping.len(), text.len());
        assert_eq!(mapping.lookup(0), Some(0.0));
        assert_eq!(mapping.lookup(17), Some(0.0)); // trailing separator
        assert_eq!(mapping.lookup(18), Some(2.5));
        assert_eq!(mapping.lookup(35), Some(7.0));
        assert_eq!(mapping.lookup(text.len()), None);
    }

    #[test]
    fn test_sentence_timestamps_come_from_first_word() {
        let split = split_sentences(&fragments(), &RuleTokenizer::default());
        assert_eq!(split.tokenizer, TokenizerUsed::Primary);
        assert_eq!(
            split.texts(),
            vec!["Hello world.", "This spans fragments.", "Last one here."]
        );
        assert_eq!(split.timestamps(), vec![0.0, 0.0, 7.0]);
    }

    #[test]
    fn test_tokenizer_failure_uses_punctuation_split() {
        let split = split_sentences(&fragments(), &BrokenTokenizer);
        assert_eq!(split.tokenizer, TokenizerUsed::PunctuationFallback);
        assert_eq!(split.sentences.len(), 3);
        assert_eq!(split.sentences[2].timestamp, 7.0);
    }

    #[test]
    fn test_unlocatable_sentence_inherits_previous_time() {
        let split = split_sentences(&fragments(), &InventingTokenizer);
        assert_eq!(split.sentences[1].text, "Never said this.");
        assert_eq!(split.sentences[1].timestamp, split.sentences[0].timestamp);
    }

    #[test]
    fn test_repeated_sentence_maps_to_first_occurrence() {
        let fragments = vec![
            TranscriptFragment::new("Na na na.", 0.0, 1.0),
            TranscriptFragment::new("Hey there.", 5.0, 1.0),
            TranscriptFragment::new("Na na na.", 30.0, 1.0),
        ];
        let split = split_sentences(&fragments, &RuleTokenizer::default());
        assert_eq!(split.timestamps(), vec![0.0, 5.0, 0.0]);
    }

    #[test]
    fn test_multibyte_text_maps_correctly() {
        let fragments = vec![
            TranscriptFragment::new("Café crème.", 0.0, 1.0),
            TranscriptFragment::new("Über alles.", 4.0, 1.0),
        ];
        let split = split_sentences(&fragments, &RuleTokenizer::default());
        assert_eq!(split.timestamps(), vec![0.0, 4.0]);
    }
}
