pub mod wikipedia;

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::nlp::stopwords::is_stop_word;
use crate::nlp::tagger::{entities, noun_phrases, PosTagger, TaggedToken};
use crate::nlp::{prefix_bytes, rank_by_frequency, suffix_bytes};

/// Leading sample searched for entities first.
const HEAD_BYTES: usize = 5000;
/// Size of the middle and tail samples taken from longer texts.
const SAMPLE_BYTES: usize = 2000;
/// Texts longer than this also get their tail sampled.
const TAIL_THRESHOLD_BYTES: usize = 7000;
const MIN_PHRASE_CHARS: usize = 5;
const LOOKUP_BATCH: usize = 3;

/// An encyclopedia article summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub url: String,
}

/// Looks up a short article for a term. `Ok(None)` means nothing matched.
pub trait Encyclopedia: Send + Sync {
    fn name(&self) -> &str;
    fn lookup(&self, term: &str) -> Result<Option<Article>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyTerm {
    pub key_term: String,
    pub wikipedia_info: Option<Article>,
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-zA-Z]{4,}\b").expect("word pattern is valid"))
}

fn capitalized_phrase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b").expect("phrase pattern is valid")
    })
}

/// The most prominent terms of a transcript.
///
/// With a tagger, named entities are preferred and noun phrases fill any
/// remaining slots. Without one, or if tagging fails, frequent content words
/// and capitalized phrases are used.
pub fn extract_key_terms(
    text: &str,
    max_terms: usize,
    tagger: Option<&dyn PosTagger>,
) -> Vec<String> {
    if let Some(tagger) = tagger {
        match tagged_terms(text, max_terms, tagger) {
            Ok(terms) => return terms,
            Err(e) => tracing::warn!("Tagged term extraction failed, using word counts: {}", e),
        }
    }
    frequent_terms(text, max_terms)
}

fn middle_sample(text: &str) -> &str {
    let mut start = text.len() / 2;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    prefix_bytes(&text[start..], SAMPLE_BYTES)
}

fn tagged_terms(text: &str, max_terms: usize, tagger: &dyn PosTagger) -> Result<Vec<String>> {
    let head = tagger.tag(prefix_bytes(text, HEAD_BYTES))?;
    let mut found = entities(&head);
    let mut terms = rank_by_frequency(found.clone(), max_terms);

    let mut middle: Option<Vec<TaggedToken>> = None;
    if terms.len() < max_terms && text.len() > HEAD_BYTES {
        let tokens = tagger.tag(middle_sample(text))?;
        found.extend(entities(&tokens));
        middle = Some(tokens);

        if text.len() > TAIL_THRESHOLD_BYTES {
            let tail = tagger.tag(suffix_bytes(text, SAMPLE_BYTES))?;
            found.extend(entities(&tail));
        }
        terms = rank_by_frequency(found, max_terms);
    }

    if terms.len() < max_terms {
        let substantial = |phrases: Vec<String>| {
            phrases
                .into_iter()
                .filter(|p| p.chars().count() > MIN_PHRASE_CHARS)
                .collect::<Vec<_>>()
        };
        let mut phrases = substantial(noun_phrases(&head));
        if let Some(tokens) = &middle {
            if terms.len() + phrases.len() < max_terms {
                phrases.extend(substantial(noun_phrases(tokens)));
            }
        }

        let mut seen: HashSet<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        for phrase in rank_by_frequency(phrases, max_terms - terms.len()) {
            if seen.insert(phrase.to_lowercase()) {
                terms.push(phrase);
            }
        }
    }

    tracing::debug!("Tagged extraction found {} terms", terms.len());
    terms.truncate(max_terms);
    Ok(terms)
}

fn frequent_terms(text: &str, max_terms: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    let words = word_re()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| !is_stop_word(w))
        .map(str::to_string);
    let phrases = capitalized_phrase_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string());
    rank_by_frequency(words.chain(phrases), max_terms)
}

/// Extract candidate terms and enrich up to `max_terms` of them with
/// encyclopedia articles, then fill the rest with unmatched terms.
pub fn generate_key_terms(
    encyclopedia: &dyn Encyclopedia,
    tagger: Option<&dyn PosTagger>,
    transcript: &str,
    max_terms: usize,
    batch_delay: Duration,
) -> Vec<KeyTerm> {
    tracing::info!("Extracting up to {} key terms from transcript", max_terms);
    let candidates = extract_key_terms(transcript, max_terms.saturating_mul(3), tagger);
    tracing::info!("Found {} candidate terms", candidates.len());

    let mut results: Vec<KeyTerm> = Vec::new();
    let mut used_terms: HashSet<String> = HashSet::new();
    let mut used_titles: HashSet<String> = HashSet::new();

    let batches: Vec<&[String]> = candidates.chunks(LOOKUP_BATCH).collect();
    for (i, batch) in batches.iter().enumerate() {
        for term in batch.iter() {
            if results.len() >= max_terms {
                break;
            }
            if used_terms.contains(&term.to_lowercase()) {
                continue;
            }

            tracing::debug!("Looking up {} for: {}", encyclopedia.name(), term);
            let article = match encyclopedia.lookup(term) {
                Ok(article) => article,
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            };

            if let Some(article) = article {
                if used_titles.insert(article.title.clone()) {
                    used_terms.insert(term.to_lowercase());
                    results.push(KeyTerm {
                        key_term: term.clone(),
                        wikipedia_info: Some(article),
                    });
                }
            }
        }

        if results.len() >= max_terms {
            tracing::info!("Reached target of {} terms with articles", max_terms);
            break;
        }
        if i + 1 < batches.len() && !batch_delay.is_zero() {
            std::thread::sleep(batch_delay);
        }
    }
    tracing::info!("Found {} terms with articles", results.len());

    for term in &candidates {
        if results.len() >= max_terms {
            break;
        }
        if used_terms.insert(term.to_lowercase()) {
            results.push(KeyTerm {
                key_term: term.clone(),
                wikipedia_info: None,
            });
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DigestError;
    use crate::nlp::tagger::LexiconTagger;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const TEXT: &str = "Yesterday the team visited Grace Hopper in Washington. \
                        Then Grace Hopper talked about COBOL and compiler design.";

    /// Serves articles from a fixed table and records lookups.
    struct TableEncyclopedia {
        articles: HashMap<&'static str, &'static str>,
        lookups: Mutex<Vec<String>>,
    }

    impl TableEncyclopedia {
        fn new(entries: &[(&'static str, &'static str)]) -> Self {
            Self {
                articles: entries.iter().copied().collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }
    }

    impl Encyclopedia for TableEncyclopedia {
        fn name(&self) -> &str {
            "table"
        }

        fn lookup(&self, term: &str) -> Result<Option<Article>> {
            self.lookups.lock().unwrap().push(term.to_string());
            if term == "broken" {
                return Err(DigestError::Encyclopedia {
                    term: term.to_string(),
                    reason: "offline".to_string(),
                });
            }
            Ok(self.articles.get(term).map(|title| Article {
                title: title.to_string(),
                summary: format!("About {title}."),
                url: format!("https://en.wikipedia.org/wiki/{title}"),
            }))
        }
    }

    #[test]
    fn test_entities_come_first() {
        let terms = extract_key_terms(TEXT, 3, Some(&LexiconTagger));
        assert_eq!(terms, vec!["Grace Hopper", "Washington", "COBOL"]);
    }

    #[test]
    fn test_noun_phrases_backfill_without_duplicates() {
        let terms = extract_key_terms(TEXT, 8, Some(&LexiconTagger));
        assert!(terms.len() <= 8);
        assert_eq!(terms[0], "Grace Hopper");
        assert!(terms.contains(&"compiler design".to_string()), "{terms:?}");
        let lowered: HashSet<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        assert_eq!(lowered.len(), terms.len());
    }

    #[test]
    fn test_long_text_samples_middle_and_tail() {
        let filler = "plain words without names here. ";
        // the middle sample starts just before Ada Lovelace
        let text = format!(
            "{}Then Ada Lovelace wrote notes. {}Then Alan Turing arrived.",
            filler.repeat(210),
            filler.repeat(200)
        );
        let terms = extract_key_terms(&text, 2, Some(&LexiconTagger));
        assert_eq!(terms, vec!["Ada Lovelace", "Alan Turing"]);
    }

    #[test]
    fn test_frequency_terms_without_tagger() {
        let text = "Rust compilers check borrowing. Rust compilers are strict. \
                    Graydon Hoare started Rust.";
        let terms = extract_key_terms(text, 3, None);
        assert_eq!(terms, vec!["rust", "compilers", "check"]);

        let terms = extract_key_terms(text, 20, None);
        assert!(terms.contains(&"Graydon Hoare".to_string()));
        assert!(!terms.iter().any(|t| t == "are"));
    }

    #[test]
    fn test_tagger_failure_falls_back_to_word_counts() {
        struct BrokenTagger;

        impl PosTagger for BrokenTagger {
            fn name(&self) -> &str {
                "broken"
            }

            fn tag(&self, _text: &str) -> Result<Vec<TaggedToken>> {
                Err(DigestError::Tagging("model missing".to_string()))
            }
        }

        assert_eq!(
            extract_key_terms(TEXT, 4, Some(&BrokenTagger)),
            extract_key_terms(TEXT, 4, None)
        );
    }

    #[test]
    fn test_generate_key_terms_enriches_and_backfills() {
        let encyclopedia = TableEncyclopedia::new(&[
            ("Grace Hopper", "Grace Hopper"),
            ("Washington", "Washington, D.C."),
        ]);
        let terms = generate_key_terms(
            &encyclopedia,
            Some(&LexiconTagger),
            TEXT,
            3,
            Duration::ZERO,
        );
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[0].key_term, "Grace Hopper");
        assert_eq!(
            terms[1].wikipedia_info.as_ref().map(|a| a.title.as_str()),
            Some("Washington, D.C.")
        );
        assert!(terms[2].wikipedia_info.is_none());
    }

    #[test]
    fn test_duplicate_titles_and_errors_are_skipped() {
        let encyclopedia = TableEncyclopedia::new(&[("alpha", "Alpha"), ("beta", "Alpha")]);
        let text = "alpha alpha alpha beta beta broken";
        let terms = generate_key_terms(&encyclopedia, None, text, 2, Duration::ZERO);

        assert_eq!(terms[0].key_term, "alpha");
        assert!(terms[0].wikipedia_info.is_some());
        // "beta" maps to an article already used, so it is backfilled bare
        assert_eq!(terms[1].key_term, "beta");
        assert!(terms[1].wikipedia_info.is_none());
        assert_eq!(
            *encyclopedia.lookups.lock().unwrap(),
            vec!["alpha", "beta", "broken"]
        );
    }
}
