use serde::Serialize;

use crate::config::TimestampsConfig;
use crate::error::{DigestError, Result};
use crate::models::ModelRegistry;
use crate::summarize::prompt::{chunk_words, strip_noise};
use crate::summarize::{extract_key_sentences, split_summary_sentences, Summarizer, SummaryParams};
use crate::timestamps::segments_for_fetch;
use crate::transcript::{segment_text, transcript_text, TranscriptSource};

/// Below this many words the text is summarized extractively.
const SHORT_TEXT_WORDS: usize = 200;
const CHUNK_WORDS: usize = 800;
const MIN_CHUNK_WORDS: usize = 50;
/// Texts at least this long with several chunks get a combining pass.
const META_SUMMARY_WORDS: usize = 500;

/// Key points are summary sentences longer than this many characters.
const MIN_KEY_POINT_CHARS: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub summary: String,
    pub transcript: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub video_id: String,
    pub segment_id: usize,
    pub summary: String,
    pub timestamp: f64,
    pub formatted_time: String,
    pub title: String,
}

/// Summarize text of any length, aiming for `target_min..=target_max` words.
///
/// Long text is summarized in chunks. Each chunk is tried with strict
/// parameters, then with relaxed sampling, then extractively, so this
/// always produces a summary.
pub fn summarize_text(
    summarizer: &dyn Summarizer,
    text: &str,
    target_min: usize,
    target_max: usize,
) -> String {
    let word_count = text.split_whitespace().count();
    tracing::info!("Transcript word count: {}", word_count);

    if word_count < SHORT_TEXT_WORDS {
        tracing::info!("Text too short for abstractive summarization, using extractive method");
        return extract_key_sentences(text, 3);
    }

    let min_length = target_min.min((word_count / 10).max(30));
    let max_length = target_max.min((min_length + 50).max(word_count / 3));
    tracing::info!(
        "Using min_length={}, max_length={} with {}",
        min_length,
        max_length,
        summarizer.name()
    );

    let chunks = chunk_words(text, CHUNK_WORDS, MIN_CHUNK_WORDS);
    if chunks.is_empty() {
        return extract_key_sentences(text, 5);
    }

    let mut partial_summaries = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        tracing::info!("Summarizing chunk {}/{}", i + 1, chunks.len());
        partial_summaries.push(summarize_chunk(
            summarizer,
            chunk,
            min_length,
            max_length,
            chunks.len(),
        ));
    }

    let combined = partial_summaries.join(" ");
    if chunks.len() <= 1 || word_count < META_SUMMARY_WORDS {
        return combined;
    }

    tracing::info!("Generating combining summary over {} chunks", chunks.len());
    let params = SummaryParams {
        min_length,
        max_length,
        sample: false,
    };
    match summarizer.summarize(&combined, &params) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!("Combining summary failed: {}", e);
            combined
        }
    }
}

fn summarize_chunk(
    summarizer: &dyn Summarizer,
    chunk: &str,
    min_length: usize,
    max_length: usize,
    chunk_count: usize,
) -> String {
    let strict = SummaryParams {
        min_length: min_length / chunk_count,
        max_length: (max_length / chunk_count).max(1),
        sample: false,
    };
    match summarizer.summarize(chunk, &strict) {
        Ok(summary) => return summary,
        Err(e) => tracing::warn!("Summarization attempt failed: {}", e),
    }

    let relaxed = SummaryParams {
        min_length: 10,
        max_length,
        sample: true,
    };
    match summarizer.summarize(chunk, &relaxed) {
        Ok(summary) => return summary,
        Err(e) => tracing::warn!("Relaxed summarization attempt failed: {}", e),
    }

    tracing::warn!("Using extractive fallback for chunk");
    extract_key_sentences(chunk, 2)
}

/// Fetch a video's transcript and summarize it.
pub fn summarize_video(
    summarizer: &dyn Summarizer,
    source: &dyn TranscriptSource,
    video_id: &str,
    min_length: usize,
    max_length: usize,
) -> Result<VideoSummary> {
    let fragments = source.fetch(video_id)?;
    let transcript = transcript_text(&fragments);
    let cleaned = strip_noise(&transcript);
    if cleaned.is_empty() {
        return Err(DigestError::TranscriptUnavailable {
            video_id: video_id.to_string(),
        });
    }

    tracing::info!(
        "Generating summary (target length: {}-{} words)",
        min_length,
        max_length
    );
    let summary = summarize_text(summarizer, &cleaned, min_length, max_length);

    Ok(VideoSummary {
        video_id: video_id.to_string(),
        summary,
        transcript,
    })
}

/// Summarize one segment of the video's timestamp list.
pub fn summarize_segment(
    registry: &ModelRegistry,
    summarizer: &dyn Summarizer,
    source: &dyn TranscriptSource,
    video_id: &str,
    segment_id: usize,
    config: &TimestampsConfig,
) -> Result<SegmentSummary> {
    let fetched = source.fetch(video_id);
    let segments = segments_for_fetch(registry, &fetched, video_id, config);

    let segment = segments
        .get(segment_id)
        .ok_or(DigestError::InvalidSegment {
            segment_id,
            segment_count: segments.len(),
        })?;
    let end = segments.get(segment_id + 1).map(|s| s.time);

    let text = match &fetched {
        Ok(fragments) => strip_noise(&segment_text(fragments, segment.time, end)),
        Err(_) => String::new(),
    };
    if text.is_empty() {
        return Err(DigestError::EmptySegment { segment_id });
    }

    let summary = summarize_text(summarizer, &text, 30, 100);

    Ok(SegmentSummary {
        video_id: video_id.to_string(),
        segment_id,
        summary,
        timestamp: segment.time,
        formatted_time: segment.formatted_time.clone(),
        title: segment.title.clone(),
    })
}

/// The substantive sentences of a summary.
pub fn key_points(summary: &str) -> Vec<String> {
    split_summary_sentences(summary)
        .into_iter()
        .filter(|s| s.chars().count() > MIN_KEY_POINT_CHARS)
        .map(str::to_string)
        .collect()
}
