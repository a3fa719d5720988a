use tempfile::TempDir;

use ytdigest::error::Result;
use ytdigest::nlp::embedding::Embedder;
use ytdigest::transcript::{TranscriptFragment, TranscriptSource};

/// Two-dimensional one-hot vectors: cats on one axis, rockets on the other.
struct TopicEmbedder;

impl Embedder for TopicEmbedder {
    fn name(&self) -> &str {
        "topic"
    }

    fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(sentences
            .iter()
            .map(|s| {
                if s.to_lowercase().contains("cat") {
                    vec![1.0, 0.0]
                } else {
                    vec![0.0, 1.0]
                }
            })
            .collect())
    }
}

struct MemorySource(Vec<TranscriptFragment>);

impl TranscriptSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, _video_id: &str) -> Result<Vec<TranscriptFragment>> {
        Ok(self.0.clone())
    }
}

fn cats_then_rockets() -> Vec<TranscriptFragment> {
    let lines = [
        "Cats sleep most of the day.",
        "A cat purrs when it is calm.",
        "Cats groom their fur often.",
        "Every cat likes a warm spot.",
        "Some cats chase laser dots.",
        "Old cats nap even longer.",
        "Rockets burn fuel to climb.",
        "Each rocket stage drops away.",
        "Boosters land on barges now.",
        "Engines throttle during ascent.",
        "Orbit needs great horizontal speed.",
        "Rockets reach orbit in minutes.",
    ];
    lines
        .iter()
        .enumerate()
        .map(|(i, text)| TranscriptFragment::new(*text, i as f64 * 15.0, 15.0))
        .collect()
}

#[test]
fn test_topic_change_becomes_segment_boundary() {
    use ytdigest::config::TimestampsConfig;
    use ytdigest::models::ModelRegistry;
    use ytdigest::nlp::sentences::RuleTokenizer;
    use ytdigest::timestamps::keywords::KeywordMethod;
    use ytdigest::timestamps::topics::TopicMethod;
    use ytdigest::timestamps::analyze;

    let registry = ModelRegistry::new(
        Box::new(RuleTokenizer::default()),
        Box::new(TopicEmbedder),
        None,
    );
    let result = analyze(&registry, &cats_then_rockets(), &TimestampsConfig::default()).unwrap();

    let topics = result.topics.unwrap();
    assert_eq!(topics.method, TopicMethod::Semantic);
    assert_eq!(topics.indices, vec![0, 5, 6, 11]);
    // contiguous captions, so no pauses
    assert!(result.silences.is_empty());

    // 90 s is within 20 s of the boundary kept at 75 s
    let times: Vec<f64> = result.segments.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![0.0, 75.0, 165.0]);
    assert_eq!(result.segments[1].formatted_time, "1:15");
    assert_eq!(result.segments[1].title, "Old cats nap even longer.");
    assert!(result
        .keyword_methods
        .iter()
        .all(|m| *m == KeywordMethod::Frequency));
}

#[test]
fn test_file_source_end_to_end() {
    use ytdigest::config::Config;
    use ytdigest::models::ModelRegistry;
    use ytdigest::timestamps::generate_timestamps;
    use ytdigest::transcript::build_source;

    let tmp = TempDir::new().unwrap();
    let json = serde_json::to_string(&cats_then_rockets()).unwrap();
    std::fs::write(tmp.path().join("dQw4w9WgXcQ.json"), json).unwrap();

    let mut config = Config::default();
    config.transcript.directory = tmp.path().to_path_buf();
    let source = build_source(&config, Some("file")).unwrap();
    let registry = ModelRegistry::local();

    let segments = generate_timestamps(&registry, source.as_ref(), "dQw4w9WgXcQ", &config.timestamps);
    assert!(!segments.is_empty());
    assert!(segments.len() <= config.timestamps.max_segments);
    assert_eq!(segments[0].time, 0.0);
    assert_eq!(segments[0].title, "Cats sleep most of the day.");
    for (i, pair) in segments.windows(2).enumerate() {
        assert!(pair[1].time - pair[0].time >= config.timestamps.min_segment_duration);
        assert_eq!(pair[0].segment_id, i);
    }

    let missing = generate_timestamps(&registry, source.as_ref(), "missingvid0", &config.timestamps);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].title, "Video content");
}

#[test]
fn test_extractive_summary_and_key_points() {
    use ytdigest::summarize::runner::{key_points, summarize_video};
    use ytdigest::summarize::ExtractiveSummarizer;

    let source = MemorySource(cats_then_rockets());
    let result = summarize_video(&ExtractiveSummarizer, &source, "abc", 150, 300).unwrap();

    assert_eq!(
        result.summary,
        "Cats sleep most of the day. Every cat likes a warm spot. Rockets reach orbit in minutes."
    );
    assert!(result.transcript.starts_with("Cats sleep most of the day. A cat purrs"));
    assert_eq!(key_points(&result.summary).len(), 3);
}

#[test]
fn test_key_terms_with_offline_encyclopedia() {
    use ytdigest::keyterms::{generate_key_terms, Article, Encyclopedia};
    use ytdigest::nlp::tagger::LexiconTagger;

    struct OnlyRust;

    impl Encyclopedia for OnlyRust {
        fn name(&self) -> &str {
            "only-rust"
        }

        fn lookup(&self, term: &str) -> Result<Option<Article>> {
            Ok((term == "Rust Foundation").then(|| Article {
                title: "Rust Foundation".to_string(),
                summary: "A non-profit that stewards Rust.".to_string(),
                url: "https://en.wikipedia.org/wiki/Rust_Foundation".to_string(),
            }))
        }
    }

    let transcript = "Today the Rust Foundation announced grants. \
                      Later the Rust Foundation thanked Mozilla for years of support.";
    let terms = generate_key_terms(
        &OnlyRust,
        Some(&LexiconTagger),
        transcript,
        3,
        std::time::Duration::ZERO,
    );

    assert_eq!(terms.len(), 3);
    assert_eq!(terms[0].key_term, "Rust Foundation");
    assert!(terms[0].wikipedia_info.is_some());
    assert!(terms[1..].iter().all(|t| t.wikipedia_info.is_none()));
    assert!(terms.iter().any(|t| t.key_term == "Mozilla"));
}

#[test]
fn test_comment_sentiment_report() {
    use ytdigest::sentiment::lexicon::LexiconClassifier;
    use ytdigest::sentiment::{analyze_comments, CommentSource};

    struct Comments;

    impl CommentSource for Comments {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch_comments(&self, _video_id: &str) -> Result<Vec<String>> {
            Ok(vec![
                "Loved this explanation".to_string(),
                "Boring and too long".to_string(),
                "Very helpful, thank you".to_string(),
                "word ".repeat(500),
            ])
        }
    }

    let result = analyze_comments(&Comments, &LexiconClassifier::default(), "abc").unwrap();
    assert_eq!(result.sentiment.total_comments, 4);
    assert_eq!(result.sentiment.positive_percentage, 50.0);
    assert_eq!(result.sentiment.negative_percentage, 25.0);
    assert_eq!(result.comments_sample.len(), 4);

    let json = serde_json::to_value(&result.sentiment).unwrap();
    assert!(json.get("positive_percentage").is_some());
}
