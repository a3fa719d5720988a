pub mod file;
pub mod youtube;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{DigestError, Result};

/// One timed unit of caption text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl TranscriptFragment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Anything that can produce the ordered caption fragments for a video.
///
/// Implementations must return `DigestError::TranscriptUnavailable` when the
/// video has no captions, and `DigestError::TranscriptFetch` (or an HTTP/IO
/// error) for transient failures.
pub trait TranscriptSource: Send + Sync {
    fn name(&self) -> &str;
    fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptFragment>>;
}

/// Build the transcript source named in config, optionally overridden.
pub fn build_source(
    config: &Config,
    source_override: Option<&str>,
) -> anyhow::Result<Box<dyn TranscriptSource>> {
    let source_name = source_override.unwrap_or(&config.transcript.source);

    match source_name {
        "youtube" => Ok(Box::new(youtube::YouTubeTranscriptSource::new(
            &config.transcript,
        )?)),
        "file" => Ok(Box::new(file::FileTranscriptSource::new(
            config.transcript.directory.clone(),
        ))),
        other => anyhow::bail!("Unknown transcript source: {}", other),
    }
}

/// Whole transcript as plain text, fragments joined by single spaces.
pub fn transcript_text(fragments: &[TranscriptFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the fragments whose start lies in `[start_time, end_time)`.
/// An `end_time` of `None` means "until the end of the video".
pub fn segment_text(
    fragments: &[TranscriptFragment],
    start_time: f64,
    end_time: Option<f64>,
) -> String {
    fragments
        .iter()
        .filter(|f| in_span(f.start, start_time, end_time))
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn in_span(t: f64, start: f64, end: Option<f64>) -> bool {
    t >= start && end.map_or(true, |e| t < e)
}

/// Fetch a video's transcript and reassemble the text of one time window.
///
/// Never fails: a missing or unreachable transcript yields an empty string.
pub fn get_segment_transcript(
    source: &dyn TranscriptSource,
    video_id: &str,
    start_time: f64,
    end_time: Option<f64>,
) -> String {
    match source.fetch(video_id) {
        Ok(fragments) => segment_text(&fragments, start_time, end_time),
        Err(e) => {
            tracing::warn!(
                "Could not get segment transcript for {} ({}): {}",
                video_id,
                source.name(),
                e
            );
            String::new()
        }
    }
}

/// Reject fragments whose timing cannot be placed on the video timeline.
pub(crate) fn validate(fragments: &[TranscriptFragment]) -> Result<()> {
    for (i, f) in fragments.iter().enumerate() {
        if !f.start.is_finite() || !f.duration.is_finite() {
            return Err(DigestError::InvalidTranscript(format!(
                "fragment {} has non-finite timing (start={}, duration={})",
                i, f.start, f.duration
            )));
        }
        if f.start < 0.0 || f.duration < 0.0 {
            return Err(DigestError::InvalidTranscript(format!(
                "fragment {} has negative timing (start={}, duration={})",
                i, f.start, f.duration
            )));
        }
    }
    Ok(())
}

/// Extract the 11-character video id from a YouTube URL or bare id.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if is_video_id(input) {
        return Some(input.to_string());
    }

    let parsed = url::Url::parse(input)
        .or_else(|_| url::Url::parse(&format!("https://{}", input)))
        .ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    if host == "youtu.be" {
        let id = parsed.path_segments()?.next()?;
        return is_video_id(id).then(|| id.to_string());
    }

    if !host.ends_with("youtube.com") && !host.ends_with("youtube-nocookie.com") {
        return None;
    }

    if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| k == "v") {
        return is_video_id(&v).then(|| v.into_owned());
    }

    let mut segments = parsed.path_segments()?;
    match segments.next()? {
        "embed" | "shorts" | "v" | "live" => {
            let id = segments.next()?;
            is_video_id(id).then(|| id.to_string())
        }
        _ => None,
    }
}

fn is_video_id(s: &str) -> bool {
    s.len() == 11
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
