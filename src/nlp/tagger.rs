use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::nlp::stopwords::is_stop_word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PosTag {
    Noun,
    ProperNoun,
    Verb,
    Adjective,
    Adverb,
    Number,
    Punctuation,
    Other,
}

impl PosTag {
    pub fn is_nominal(self) -> bool {
        matches!(self, PosTag::Noun | PosTag::ProperNoun)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedToken {
    pub text: String,
    pub pos: PosTag,
    pub is_stop: bool,
}

/// Optional part-of-speech capability used by keyword and key-term extraction.
pub trait PosTagger: Send + Sync {
    fn name(&self) -> &str;
    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>>;
}

const FUNCTION_WORDS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "my", "your", "his", "her", "its", "our",
    "their", "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them", "who",
    "whom", "which", "what", "and", "or", "but", "nor", "so", "yet", "if", "then", "than",
    "because", "while", "when", "where", "of", "in", "on", "at", "by", "for", "with", "about",
    "to", "from", "into", "over", "under", "between", "through", "after", "before", "is", "are",
    "was", "were", "be", "been", "being", "am", "do", "does", "did", "have", "has", "had",
    "not", "no", "there", "here", "all", "some", "any", "each", "every",
];

const MODALS: &[&str] = &[
    "to", "can", "could", "will", "would", "shall", "should", "may", "might", "must",
];

const COMMON_VERBS: &[&str] = &[
    "make", "makes", "made", "take", "takes", "took", "give", "gives", "gave", "know", "knows",
    "knew", "think", "thinks", "thought", "see", "sees", "saw", "come", "comes", "came", "want",
    "wants", "find", "finds", "found", "tell", "tells", "told", "become", "became", "show",
    "shows", "leave", "left", "feel", "feels", "felt", "bring", "brings", "brought", "begin",
    "began", "keep", "keeps", "kept", "hold", "holds", "held", "write", "writes", "wrote",
    "stand", "hear", "heard", "mean", "means", "meant", "meet", "run", "runs", "ran", "build",
    "builds", "built", "learn", "learns", "grow", "grew", "explain", "explains", "say", "says",
    "said", "get", "gets", "got", "go", "goes", "went", "use", "uses", "work", "works", "need",
    "needs", "look", "looks", "try", "tries", "ask", "asks", "seem", "seems", "help", "helps",
    "talk", "talks", "turn", "turns", "start", "starts", "call", "calls", "move", "moves",
    "live", "lives", "believe", "believes", "happen", "happens", "create", "creates", "change",
    "changes", "allow", "allows", "understand", "understands", "discuss", "discusses",
];

const SUFFIX_NOUNS: &[&str] = &[
    "thing", "things", "nothing", "something", "everything", "anything", "string", "strings",
    "morning", "evening", "during", "ceiling", "king", "ring", "spring", "sibling", "wedding",
    "need", "speed", "seed", "feed", "bed", "red", "family", "supply", "italy", "july",
];

const VERB_SUFFIXES: &[&str] = &["ize", "ise", "ify", "izes", "ises", "ifies"];
const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ous", "ful", "ive", "able", "ible", "less", "ical",
];

struct Lexicon {
    function_words: HashSet<&'static str>,
    modals: HashSet<&'static str>,
    common_verbs: HashSet<&'static str>,
    suffix_nouns: HashSet<&'static str>,
}

fn lexicon() -> &'static Lexicon {
    static LEX: OnceLock<Lexicon> = OnceLock::new();
    LEX.get_or_init(|| Lexicon {
        function_words: FUNCTION_WORDS.iter().copied().collect(),
        modals: MODALS.iter().copied().collect(),
        common_verbs: COMMON_VERBS.iter().copied().collect(),
        suffix_nouns: SUFFIX_NOUNS.iter().copied().collect(),
    })
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\w+(?:['’]\w+)*(?:-\w+)*|[^\w\s]").expect("token pattern is valid")
    })
}

/// Rule-based English tagger: a closed-class lexicon, capitalization and
/// suffix heuristics, defaulting to noun. No model files required.
#[derive(Debug, Default, Clone)]
pub struct LexiconTagger;

fn starts_upper(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn is_acronym(word: &str) -> bool {
    word.chars().count() >= 2
        && word.chars().any(char::is_alphabetic)
        && word.chars().all(|c| !c.is_lowercase())
}

fn has_inner_capital(word: &str) -> bool {
    word.chars().skip(1).any(char::is_uppercase) && word.chars().any(char::is_lowercase)
}

fn lowercase_rules(lower: &str, after_modal: bool) -> PosTag {
    let lex = lexicon();
    if lex.function_words.contains(lower) {
        return PosTag::Other;
    }
    if lex.common_verbs.contains(lower) || after_modal {
        return PosTag::Verb;
    }
    if lex.suffix_nouns.contains(lower) {
        return PosTag::Noun;
    }

    let len = lower.chars().count();
    if len > 4 && lower.ends_with("ly") {
        return PosTag::Adverb;
    }
    if (len > 5 && lower.ends_with("ing"))
        || (len > 4 && lower.ends_with("ed") && !lower.ends_with("eed"))
        || VERB_SUFFIXES.iter().any(|s| lower.ends_with(s))
    {
        return PosTag::Verb;
    }
    if len > 5 && ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return PosTag::Adjective;
    }
    PosTag::Noun
}

impl PosTagger for LexiconTagger {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>> {
        let words: Vec<&str> = token_re().find_iter(text).map(|m| m.as_str()).collect();
        let lex = lexicon();
        let mut tokens = Vec::with_capacity(words.len());

        for (i, word) in words.iter().enumerate() {
            let first = word.chars().next().unwrap_or(' ');
            let lower = word.to_lowercase();

            let pos = if !first.is_alphanumeric() && first != '_' {
                PosTag::Punctuation
            } else if word.chars().all(|c| c.is_ascii_digit() || c == '-') {
                PosTag::Number
            } else {
                let sentence_initial =
                    i == 0 || matches!(words[i - 1], "." | "!" | "?" | "…" | ":" | "\"");
                let after_modal = i > 0 && lex.modals.contains(words[i - 1].to_lowercase().as_str());
                let next_capitalized = words.get(i + 1).is_some_and(|w| starts_upper(w));

                if is_acronym(word) && !lex.function_words.contains(lower.as_str()) {
                    PosTag::ProperNoun
                } else if has_inner_capital(word) {
                    PosTag::ProperNoun
                } else if starts_upper(word) && !lex.function_words.contains(lower.as_str()) {
                    if !sentence_initial || next_capitalized {
                        PosTag::ProperNoun
                    } else {
                        lowercase_rules(&lower, after_modal)
                    }
                } else {
                    lowercase_rules(&lower, after_modal)
                }
            };

            tokens.push(TaggedToken {
                text: word.to_string(),
                pos,
                is_stop: is_stop_word(word),
            });
        }

        Ok(tokens)
    }
}

/// Maximal runs of adjacent proper nouns ("Grace Hopper", "NASA").
pub fn entities(tokens: &[TaggedToken]) -> Vec<String> {
    let mut out = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    for token in tokens {
        if token.pos == PosTag::ProperNoun {
            run.push(&token.text);
        } else if !run.is_empty() {
            out.push(run.join(" "));
            run.clear();
        }
    }
    if !run.is_empty() {
        out.push(run.join(" "));
    }
    out
}

fn flush_phrase(run: &mut Vec<&TaggedToken>, out: &mut Vec<String>) {
    while run.last().is_some_and(|t| !t.pos.is_nominal()) {
        run.pop();
    }
    if !run.is_empty() {
        let phrase: Vec<&str> = run.iter().map(|t| t.text.as_str()).collect();
        out.push(phrase.join(" "));
    }
    run.clear();
}

/// Adjective/noun runs that end in a noun, with stop words breaking runs.
pub fn noun_phrases(tokens: &[TaggedToken]) -> Vec<String> {
    let mut out = Vec::new();
    let mut run: Vec<&TaggedToken> = Vec::new();

    for token in tokens {
        let joinable = !token.is_stop
            && matches!(
                token.pos,
                PosTag::Noun | PosTag::ProperNoun | PosTag::Adjective
            );
        if joinable {
            run.push(token);
        } else {
            flush_phrase(&mut run, &mut out);
        }
    }
    flush_phrase(&mut run, &mut out);
    out
}
