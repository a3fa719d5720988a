use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};

use ytdigest::config::{Config, TimestampsConfig};
use ytdigest::error::DigestError;
use ytdigest::keyterms::{generate_key_terms, Encyclopedia};
use ytdigest::models::ModelRegistry;
use ytdigest::sentiment::{analyze_comments, CommentSource, SentimentClassifier};
use ytdigest::summarize::runner::{key_points, summarize_segment, summarize_video};
use ytdigest::summarize::Summarizer;
use ytdigest::timestamps::generate_timestamps;
use ytdigest::transcript::{
    extract_video_id, get_segment_transcript, transcript_text, TranscriptSource,
};

/// Accept a bare video id or any common YouTube URL form.
pub fn resolve_video(input: &str) -> Result<String> {
    extract_video_id(input)
        .ok_or_else(|| anyhow::anyhow!("Not a YouTube video id or URL: {}", input))
}

/// Wrap a command payload in the `status`/`videoId`/`timestamp` envelope.
/// Payload fields take precedence over the envelope's.
pub fn envelope(video_id: &str, payload: Value) -> Value {
    let mut out = Map::new();
    out.insert("status".into(), json!("success"));
    out.insert("videoId".into(), json!(video_id));
    out.insert("timestamp".into(), json!(chrono::Utc::now().to_rfc3339()));
    if let Value::Object(fields) = payload {
        out.extend(fields);
    }
    Value::Object(out)
}

pub fn error_envelope(video_id: &str, error: &anyhow::Error) -> Value {
    json!({
        "status": "error",
        "videoId": video_id,
        "error": format!("{:#}", error),
    })
}

/// Print the command result as pretty JSON; failures are printed as an error
/// envelope and passed on so the process exits non-zero.
pub fn respond(video_id: &str, result: Result<Value>) -> Result<()> {
    match result {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&envelope(video_id, payload))?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&error_envelope(video_id, &e))?);
            Err(e)
        }
    }
}

pub fn timestamps(
    registry: &ModelRegistry,
    source: &dyn TranscriptSource,
    video_id: &str,
    config: &TimestampsConfig,
) -> Result<Value> {
    let segments = generate_timestamps(registry, source, video_id, config);
    Ok(json!({ "timestamps": segments }))
}

pub fn segment_transcript(
    source: &dyn TranscriptSource,
    video_id: &str,
    start: f64,
    end: Option<f64>,
) -> Result<Value> {
    let text = get_segment_transcript(source, video_id, start, end);
    Ok(json!({ "start": start, "end": end, "transcript": text }))
}

pub fn segment_summary(
    registry: &ModelRegistry,
    summarizer: &dyn Summarizer,
    source: &dyn TranscriptSource,
    video_id: &str,
    segment_id: usize,
    config: &TimestampsConfig,
) -> Result<Value> {
    let summary = summarize_segment(registry, summarizer, source, video_id, segment_id, config)?;
    Ok(json!({
        "segmentId": summary.segment_id,
        "summary": summary.summary,
        "timestamp": summary.timestamp,
        "formatted_time": summary.formatted_time,
        "title": summary.title,
    }))
}

pub fn summarize(
    summarizer: &dyn Summarizer,
    source: &dyn TranscriptSource,
    video_id: &str,
    min_length: usize,
    max_length: usize,
) -> Result<Value> {
    let result = summarize_video(summarizer, source, video_id, min_length, max_length)?;
    Ok(json!({ "summary": result.summary, "transcript": result.transcript }))
}

pub fn key_points_for(
    summarizer: &dyn Summarizer,
    source: &dyn TranscriptSource,
    video_id: &str,
) -> Result<Value> {
    let result = summarize_video(summarizer, source, video_id, 100, 200)?;
    Ok(json!({ "keyPoints": key_points(&result.summary) }))
}

pub fn key_terms(
    registry: &ModelRegistry,
    encyclopedia: &dyn Encyclopedia,
    source: &dyn TranscriptSource,
    video_id: &str,
    num_terms: usize,
    batch_delay: Duration,
) -> Result<Value> {
    let fragments = source.fetch(video_id)?;
    let transcript = transcript_text(&fragments);
    if transcript.trim().is_empty() {
        return Err(DigestError::TranscriptUnavailable {
            video_id: video_id.to_string(),
        }
        .into());
    }
    tracing::info!(
        "Retrieved transcript with {} words",
        transcript.split_whitespace().count()
    );

    let terms = generate_key_terms(
        encyclopedia,
        registry.tagger(),
        &transcript,
        num_terms,
        batch_delay,
    );
    if terms.len() < num_terms {
        tracing::warn!("Only generated {} of {} key terms", terms.len(), num_terms);
    }
    Ok(json!({ "keyPoints": terms }))
}

pub fn sentiment(
    comments: &dyn CommentSource,
    classifier: &dyn SentimentClassifier,
    video_id: &str,
) -> Result<Value> {
    let result = analyze_comments(comments, classifier, video_id)?;
    Ok(json!({
        "sentiment": result.sentiment,
        "comments_sample": result.comments_sample,
    }))
}

/// Write the documented default config to `path` (or the platform config
/// location) and return where it went.
pub fn init_config(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::platform_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, Config::generate_default_commented())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
