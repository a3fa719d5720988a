use std::sync::OnceLock;

use regex::Regex;

use crate::summarize::SummaryParams;

/// Caption annotations that carry no spoken content.
const NOISE_MARKERS: &[&str] = &[
    "music",
    "applause",
    "laughter",
    "laughs",
    "cheering",
    "inaudible",
    "silence",
    "noise",
    "background noise",
    "blank_audio",
];

fn noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternatives = NOISE_MARKERS
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)[\[(]\s*(?:{})\s*[\])]", alternatives))
            .expect("noise pattern is valid")
    })
}

/// Returns true if a caption line is nothing but noise markers.
pub fn is_noise(text: &str) -> bool {
    strip_noise(text).is_empty()
}

/// Remove `[Music]`-style markers and collapse whitespace.
pub fn strip_noise(text: &str) -> String {
    let cleaned = noise_re().replace_all(text, " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into pieces of `chunk_words` words, dropping pieces shorter
/// than `min_words`.
pub fn chunk_words(text: &str, chunk_words: usize, min_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(chunk_words.max(1))
        .filter(|chunk| chunk.len() >= min_words)
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Completion token budget for a summary of at most `max_words` words.
pub fn token_budget(max_words: usize) -> u32 {
    // ~1.4 tokens per English word, plus headroom for punctuation.
    let budget = max_words.saturating_mul(3) / 2 + 64;
    u32::try_from(budget).unwrap_or(u32::MAX)
}

/// Build the system and user prompts for one summarization call.
pub fn build_prompt(text: &str, params: &SummaryParams) -> (String, String) {
    let system = format!(
        "You summarize transcripts of YouTube videos. The transcript comes from \
         automatic or uploaded captions and may lack punctuation.\n\n\
         Guidelines:\n\
         - Write plain prose, no headings, bullet points or Markdown.\n\
         - Cover the main topics in the order the video presents them.\n\
         - Do not mention the transcript, the captions or the video itself.\n\
         - Use between {min} and {max} words.",
        min = params.min_length,
        max = params.max_length,
    );

    let user = format!("Transcript:\n\n{}", strip_noise(text));
    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_noise() {
        assert!(is_noise(""));
        assert!(is_noise("   "));
        assert!(is_noise("[Music]"));
        assert!(is_noise("[Applause] (laughter)"));
        assert!(!is_noise("Hello everyone"));
        assert!(!is_noise("[Music] welcome back"));
    }

    #[test]
    fn test_strip_noise() {
        assert_eq!(
            strip_noise("[Music]  so today [ Applause ] we build\n a parser"),
            "so today we build a parser"
        );
        assert_eq!(strip_noise("[Speaker 1] hi"), "[Speaker 1] hi");
    }

    #[test]
    fn test_chunk_words_drops_short_tail() {
        let text = vec!["word"; 130].join(" ");
        let chunks = chunk_words(&text, 50, 50);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].split_whitespace().count(), 50);

        let chunks = chunk_words(&text, 100, 20);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].split_whitespace().count(), 30);
    }

    #[test]
    fn test_build_prompt_includes_bounds_and_clean_text() {
        let params = SummaryParams {
            min_length: 30,
            max_length: 100,
            sample: false,
        };
        let (system, user) = build_prompt("[Music] Rust is fast.", &params);
        assert!(system.contains("between 30 and 100 words"));
        assert!(user.ends_with("Rust is fast."));
        assert!(!user.contains("[Music]"));
    }

    #[test]
    fn test_token_budget_grows_with_length() {
        assert_eq!(token_budget(100), 214);
        assert!(token_budget(300) > token_budget(100));
        assert_eq!(token_budget(usize::MAX), u32::MAX);
    }
}
