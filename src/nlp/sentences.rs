use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;

/// Splits running text into sentences.
pub trait SentenceTokenizer: Send + Sync {
    fn name(&self) -> &str;
    fn split(&self, text: &str) -> Result<Vec<String>>;
}

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "inc", "ltd",
    "co", "corp", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov",
    "dec", "no", "approx", "dept", "est", "fig", "gen", "gov", "mt", "u.s", "u.k", "a.m", "p.m",
];

const CLOSING: &[char] = &['"', '\'', '”', '’', ')', ']'];

/// Punctuation-driven tokenizer that knows common abbreviations and initials,
/// and keeps ellipses inside a sentence unless a capitalized word follows.
#[derive(Debug)]
pub struct RuleTokenizer {
    abbreviations: HashSet<&'static str>,
}

impl Default for RuleTokenizer {
    fn default() -> Self {
        Self {
            abbreviations: ABBREVIATIONS.iter().copied().collect(),
        }
    }
}

impl RuleTokenizer {
    /// True when the word ending at a period is an abbreviation or initial.
    fn is_abbreviation(&self, word: &str) -> bool {
        let word = word
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.chars().count() == 1 && word.chars().all(char::is_alphabetic) {
            return true;
        }
        self.abbreviations.contains(word.as_str())
    }
}

impl SentenceTokenizer for RuleTokenizer {
    fn name(&self) -> &str {
        "rule"
    }

    fn split(&self, text: &str) -> Result<Vec<String>> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut sentence_start = 0usize;
        let mut i = 0usize;

        while i < chars.len() {
            let (_, c) = chars[i];
            if !matches!(c, '.' | '!' | '?' | '…') {
                i += 1;
                continue;
            }

            // Consume the whole terminator run plus closing quotes/brackets.
            let term_start = i;
            while i < chars.len() && matches!(chars[i].1, '.' | '!' | '?' | '…') {
                i += 1;
            }
            let term_end = i;
            while i < chars.len() && CLOSING.contains(&chars[i].1) {
                i += 1;
            }
            let boundary = chars.get(i).map_or(text.len(), |&(b, _)| b);

            // A terminator glued to the next word ("3.5", "example.com") is not a break.
            if i < chars.len() && !chars[i].1.is_whitespace() {
                continue;
            }

            let next_word_start = chars[i..]
                .iter()
                .find(|(_, ch)| !ch.is_whitespace())
                .map(|&(_, ch)| ch);
            let next_is_upper_or_end =
                next_word_start.map_or(true, |ch| !ch.is_lowercase());

            let run: String = chars[term_start..term_end].iter().map(|&(_, ch)| ch).collect();
            let is_break = if run == "." {
                let word_start = chars[sentence_start.min(term_start)..term_start]
                    .iter()
                    .rposition(|(_, ch)| ch.is_whitespace())
                    .map_or(sentence_start, |p| sentence_start.min(term_start) + p + 1);
                let word: String = chars[word_start..term_start].iter().map(|&(_, ch)| ch).collect();
                !self.is_abbreviation(&word)
            } else if run.contains('!') || run.contains('?') {
                true
            } else {
                // Ellipsis: only a break when the next word looks like a sentence start.
                next_is_upper_or_end
            };

            if is_break {
                let start_byte = chars[sentence_start].0;
                let sentence = text[start_byte..boundary].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                sentence_start = i;
            }
        }

        if sentence_start < chars.len() {
            let rest = text[chars[sentence_start].0..].trim();
            if !rest.is_empty() {
                sentences.push(rest.to_string());
            }
        }

        Ok(sentences)
    }
}

fn punctuation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]").expect("sentence pattern is valid"))
}

/// Last-resort split on sentence-ending punctuation. Text after the final
/// terminator is dropped.
pub fn split_on_punctuation(text: &str) -> Vec<String> {
    punctuation_re()
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> Vec<String> {
        RuleTokenizer::default().split(text).unwrap()
    }

    #[test]
    fn test_basic_split() {
        assert_eq!(
            split("Hello world. Goodbye now! Are you sure? "),
            vec!["Hello world.", "Goodbye now!", "Are you sure?"]
        );
    }

    #[test]
    fn test_abbreviations_and_initials_do_not_split() {
        assert_eq!(
            split("Dr. Smith met J. R. Tolkien at 5 p.m. yesterday. Then he left."),
            vec!["Dr. Smith met J. R. Tolkien at 5 p.m. yesterday.", "Then he left."]
        );
    }

    #[test]
    fn test_decimal_and_domains_do_not_split() {
        assert_eq!(
            split("Version 3.5 is on example.com now. Try it."),
            vec!["Version 3.5 is on example.com now.", "Try it."]
        );
    }

    #[test]
    fn test_ellipsis_before_lowercase_continues() {
        assert_eq!(
            split("Well... maybe not. So... What now?"),
            vec!["Well... maybe not.", "So...", "What now?"]
        );
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        assert_eq!(
            split(r#"He said "stop." Then silence."#),
            vec![r#"He said "stop.""#, "Then silence."]
        );
    }

    #[test]
    fn test_unpunctuated_text_is_one_sentence() {
        assert_eq!(split("no punctuation at all "), vec!["no punctuation at all"]);
        assert!(split("   ").is_empty());
    }

    #[test]
    fn test_split_on_punctuation() {
        assert_eq!(
            split_on_punctuation("Hello world. Goodbye now. trailing"),
            vec!["Hello world.", "Goodbye now."]
        );
        assert!(split_on_punctuation("nothing to split").is_empty());
    }
}
