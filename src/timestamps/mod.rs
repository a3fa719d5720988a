pub mod fusion;
pub mod keywords;
pub mod sentences;
pub mod silence;
pub mod topics;

use serde::{Deserialize, Serialize};

use crate::config::TimestampsConfig;
use crate::error::Result;
use crate::models::ModelRegistry;
use crate::transcript::{self, in_span, segment_text, TranscriptFragment, TranscriptSource};

use fusion::{fuse_boundaries, FusionParams};
use keywords::{make_title, KeywordMethod};
use sentences::{split_sentences, Sentence, TokenizerUsed};
use silence::{detect_silences, silence_candidates, BoundaryCandidate, SilenceGap};
use topics::{detect_topic_shifts, TopicBoundaries, TopicParams};

/// One navigable chapter of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub time: f64,
    pub formatted_time: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub segment_id: usize,
}

impl Segment {
    fn placeholder(title: &str) -> Self {
        Self {
            time: 0.0,
            formatted_time: format_time(0.0),
            title: title.to_string(),
            keywords: Vec::new(),
            segment_id: 0,
        }
    }
}

/// `M:SS`, minutes unbounded: 125 → "2:05", 3725 → "62:05".
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Everything the pipeline decided along the way, for callers and tests
/// that need to know which fallbacks fired.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub segments: Vec<Segment>,
    pub sentences: Vec<Sentence>,
    pub tokenizer: Option<TokenizerUsed>,
    pub silences: Vec<SilenceGap>,
    /// `None` when the transcript had no sentences and fixed intervals were used.
    pub topics: Option<TopicBoundaries>,
    pub keyword_methods: Vec<KeywordMethod>,
}

/// Fetch a transcript and segment it.
///
/// Never fails: a video without captions, or any pipeline error, yields a
/// single "Video content" segment; an empty transcript yields a single
/// "Video Start" segment.
pub fn generate_timestamps(
    registry: &ModelRegistry,
    source: &dyn TranscriptSource,
    video_id: &str,
    config: &TimestampsConfig,
) -> Vec<Segment> {
    segments_for_fetch(registry, &source.fetch(video_id), video_id, config)
}

/// Segment the result of a transcript fetch, substituting placeholders for
/// failures.
pub fn segments_for_fetch(
    registry: &ModelRegistry,
    fetched: &Result<Vec<TranscriptFragment>>,
    video_id: &str,
    config: &TimestampsConfig,
) -> Vec<Segment> {
    let fragments = match fetched {
        Ok(fragments) => fragments,
        Err(e) => {
            tracing::warn!("Transcript for {} unavailable: {}", video_id, e);
            return vec![Segment::placeholder("Video content")];
        }
    };

    if fragments.is_empty() {
        tracing::info!("Transcript for {} is empty", video_id);
        return vec![Segment::placeholder("Video Start")];
    }

    match segment_transcript(registry, fragments, config) {
        Ok(segments) => segments,
        Err(e) => {
            tracing::warn!("Segmentation of {} failed: {}", video_id, e);
            vec![Segment::placeholder("Video content")]
        }
    }
}

/// Segment an already-fetched transcript.
pub fn segment_transcript(
    registry: &ModelRegistry,
    fragments: &[TranscriptFragment],
    config: &TimestampsConfig,
) -> Result<Vec<Segment>> {
    analyze(registry, fragments, config).map(|s| s.segments)
}

/// Run the full pipeline and report how each stage went.
pub fn analyze(
    registry: &ModelRegistry,
    fragments: &[TranscriptFragment],
    config: &TimestampsConfig,
) -> Result<Segmentation> {
    transcript::validate(fragments)?;

    if fragments.is_empty() {
        return Ok(Segmentation {
            segments: vec![Segment::placeholder("Video Start")],
            sentences: Vec::new(),
            tokenizer: None,
            silences: Vec::new(),
            topics: None,
            keyword_methods: Vec::new(),
        });
    }

    let silences = detect_silences(fragments, config.min_silence_duration);
    let split = split_sentences(fragments, registry.tokenizer());

    if split.sentences.is_empty() {
        tracing::warn!("No sentences found in transcript, using fixed intervals");
        let (segments, keyword_methods) = interval_segments(registry, fragments, config);
        return Ok(Segmentation {
            segments,
            sentences: Vec::new(),
            tokenizer: Some(split.tokenizer),
            silences,
            topics: None,
            keyword_methods,
        });
    }

    let params = TopicParams {
        window_size: config.window_size,
        similarity_threshold: config.similarity_threshold,
    };
    let topics = detect_topic_shifts(&split.texts(), registry.embedder(), &params);
    tracing::info!(
        "{} topic boundaries ({:?}), {} silence gaps",
        topics.indices.len(),
        topics.method,
        silences.len()
    );

    let mut candidates: Vec<BoundaryCandidate> = topics
        .indices
        .iter()
        .filter_map(|&i| split.sentences.get(i))
        .map(|s| BoundaryCandidate::topic(s.timestamp))
        .collect();
    candidates.extend(silence_candidates(&silences, config.silence_fusion_gap));

    let boundaries = fuse_boundaries(
        &candidates,
        &FusionParams {
            min_segment_duration: config.min_segment_duration,
            max_segments: config.max_segments,
        },
    );

    let (segments, keyword_methods) =
        build_segments(registry, fragments, &split.sentences, &boundaries, config);
    tracing::info!("Built {} segments", segments.len());

    Ok(Segmentation {
        segments,
        sentences: split.sentences,
        tokenizer: Some(split.tokenizer),
        silences,
        topics: Some(topics),
        keyword_methods,
    })
}

fn build_segments(
    registry: &ModelRegistry,
    fragments: &[TranscriptFragment],
    sentences: &[Sentence],
    boundaries: &[f64],
    config: &TimestampsConfig,
) -> (Vec<Segment>, Vec<KeywordMethod>) {
    let mut segments = Vec::with_capacity(boundaries.len());
    let mut methods = Vec::new();

    for (i, &start) in boundaries.iter().enumerate() {
        let end = boundaries.get(i + 1).copied();
        let formatted_time = format_time(start);
        let placeholder = format!("Segment at {}", formatted_time);

        let text = segment_text(fragments, start, end);
        let (title, keywords) = if text.trim().is_empty() {
            (placeholder, Vec::new())
        } else {
            let title = sentences
                .iter()
                .find(|s| in_span(s.timestamp, start, end))
                .map_or(placeholder, |s| make_title(&s.text));
            let outcome = registry
                .keywords()
                .extract(&text, config.keywords_per_segment);
            methods.push(outcome.method);
            (title, outcome.keywords)
        };

        segments.push(Segment {
            time: start,
            formatted_time,
            title,
            keywords,
            segment_id: i,
        });
    }

    (segments, methods)
}

/// Segments at a fixed interval, for transcripts without sentences.
fn interval_segments(
    registry: &ModelRegistry,
    fragments: &[TranscriptFragment],
    config: &TimestampsConfig,
) -> (Vec<Segment>, Vec<KeywordMethod>) {
    const NEARBY_SECS: f64 = 30.0;
    const TITLE_WORDS: usize = 5;

    let max_segments = config.fallback_max_segments.max(1);
    let duration = fragments.last().map_or(0.0, TranscriptFragment::end).max(0.0);
    let interval = config
        .fallback_interval_secs
        .max(duration / max_segments as f64)
        .max(f64::EPSILON);
    let count = ((duration / interval).floor() as usize).clamp(1, max_segments);

    let mut segments = Vec::with_capacity(count);
    let mut methods = Vec::new();
    for i in 0..count {
        let time = i as f64 * interval;
        let nearby: Vec<&str> = fragments
            .iter()
            .filter(|f| (f.start - time).abs() < NEARBY_SECS)
            .map(|f| f.text.as_str())
            .collect();
        let nearby = nearby.join(" ");
        let words: Vec<&str> = nearby.split_whitespace().collect();

        let title = match words.len() {
            0 => format!("Segment {}", i + 1),
            n if n > TITLE_WORDS => make_title(&format!("{}...", words[..TITLE_WORDS].join(" "))),
            _ => make_title(&words.join(" ")),
        };
        let keywords = if words.is_empty() {
            Vec::new()
        } else {
            let outcome = registry
                .keywords()
                .extract(&nearby, config.keywords_per_segment);
            methods.push(outcome.method);
            outcome.keywords
        };

        segments.push(Segment {
            time,
            formatted_time: format_time(time),
            title,
            keywords,
            segment_id: i,
        });
    }

    (segments, methods)
}
