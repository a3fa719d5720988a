use std::time::Duration;

use serde::Deserialize;

use crate::config::TranscriptConfig;
use crate::error::{DigestError, Result};
use crate::transcript::{TranscriptFragment, TranscriptSource};

const WATCH_URL: &str = "https://www.youtube.com/watch";

/// Fetches caption tracks straight from the public watch page.
pub struct YouTubeTranscriptSource {
    languages: Vec<String>,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedTextEvent {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Option<Vec<TimedTextSeg>>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

impl YouTubeTranscriptSource {
    pub fn new(config: &TranscriptConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            languages: config.languages.clone(),
            client,
        })
    }

    fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let response = self
            .client
            .get(WATCH_URL)
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US,en;q=0.8")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::TranscriptFetch {
                video_id: video_id.to_string(),
                reason: format!("watch page returned HTTP {}", status.as_u16()),
            });
        }
        Ok(response.text()?)
    }

    fn fetch_track(&self, video_id: &str, track: &CaptionTrack) -> Result<Vec<TranscriptFragment>> {
        tracing::info!(
            "Fetching {} captions ({}) for {}",
            track.language_code,
            if track.is_generated() { "auto" } else { "manual" },
            video_id
        );

        let response = self
            .client
            .get(&track.base_url)
            .query(&[("fmt", "json3")])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::TranscriptFetch {
                video_id: video_id.to_string(),
                reason: format!("timed text returned HTTP {}", status.as_u16()),
            });
        }

        let timed: TimedText = response.json()?;
        Ok(events_to_fragments(timed.events))
    }
}

impl TranscriptSource for YouTubeTranscriptSource {
    fn name(&self) -> &str {
        "youtube"
    }

    fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptFragment>> {
        let page = self.fetch_watch_page(video_id)?;
        let tracks = parse_caption_tracks(&page)?;

        let track = choose_track(&tracks, &self.languages).ok_or_else(|| {
            DigestError::TranscriptUnavailable {
                video_id: video_id.to_string(),
            }
        })?;

        self.fetch_track(video_id, track)
    }
}

/// Pull the caption track list out of the watch page's embedded player JSON.
/// A page without the list has no captions.
fn parse_caption_tracks(page: &str) -> Result<Vec<CaptionTrack>> {
    const MARKER: &str = "\"captionTracks\":";
    let Some(pos) = page.find(MARKER) else {
        return Ok(Vec::new());
    };
    let rest = &page[pos + MARKER.len()..];
    let Some(len) = json_array_len(rest) else {
        return Err(DigestError::InvalidTranscript(
            "unterminated captionTracks list".to_string(),
        ));
    };
    let tracks: Vec<CaptionTrack> = serde_json::from_str(&rest[..len])?;
    Ok(tracks)
}

/// Byte length of the JSON array at the start of `s`, honouring strings.
fn json_array_len(s: &str) -> Option<usize> {
    if !s.starts_with('[') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Manual track in a preferred language, then a generated one, then anything.
fn choose_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    for lang in languages {
        let matching = || tracks.iter().filter(|t| lang_matches(&t.language_code, lang));
        if let Some(t) = matching().find(|t| !t.is_generated()) {
            return Some(t);
        }
        if let Some(t) = matching().next() {
            return Some(t);
        }
    }
    tracks.first()
}

fn lang_matches(code: &str, wanted: &str) -> bool {
    code.eq_ignore_ascii_case(wanted)
        || code
            .split('-')
            .next()
            .is_some_and(|base| base.eq_ignore_ascii_case(wanted))
}

fn events_to_fragments(events: Vec<TimedTextEvent>) -> Vec<TranscriptFragment> {
    events
        .into_iter()
        .filter_map(|event| {
            let segs = event.segs?;
            let text: String = segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ").trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptFragment {
                text,
                start: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms as f64 / 1000.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(code: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.com/{code}"),
            language_code: code.to_string(),
            kind: kind.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_caption_tracks_from_page() {
        let page = r#"var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=en","languageCode":"en","kind":"asr"}],"audioTracks":[]}}};"#;
        let tracks = parse_caption_tracks(page).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].language_code, "en");
        assert!(tracks[0].is_generated());
        assert!(tracks[0].base_url.contains("&lang=en"));
    }

    #[test]
    fn test_parse_caption_tracks_with_nested_arrays() {
        let page = r#"x"captionTracks":[{"baseUrl":"u1","name":{"runs":[{"text":"English ]"}]},"languageCode":"en"},{"baseUrl":"u2","languageCode":"fr"}],"y":1"#;
        let tracks = parse_caption_tracks(page).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].base_url, "u2");
        assert!(!tracks[0].is_generated());
    }

    #[test]
    fn test_parse_caption_tracks_missing_means_none() {
        let tracks = parse_caption_tracks("<html>no captions here</html>").unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_choose_track_prefers_manual_in_language() {
        let tracks = vec![
            track("de", None),
            track("en", Some("asr")),
            track("en-GB", None),
        ];
        let chosen = choose_track(&tracks, &["en".to_string()]).unwrap();
        assert_eq!(chosen.language_code, "en-GB");
    }

    #[test]
    fn test_choose_track_falls_back_to_first() {
        let tracks = vec![track("de", None), track("fr", None)];
        let chosen = choose_track(&tracks, &["en".to_string()]).unwrap();
        assert_eq!(chosen.language_code, "de");
        assert!(choose_track(&[], &["en".to_string()]).is_none());
    }

    #[test]
    fn test_events_to_fragments_skips_empty_events() {
        let json = r#"{"events":[
            {"tStartMs":0,"dDurationMs":5000},
            {"tStartMs":1200,"dDurationMs":2500,"segs":[{"utf8":"hello"},{"utf8":" there"}]},
            {"tStartMs":3700,"dDurationMs":100,"segs":[{"utf8":"\n"}]},
            {"tStartMs":4000,"dDurationMs":2000,"segs":[{"utf8":"general\nKenobi"}]}
        ]}"#;
        let timed: TimedText = serde_json::from_str(json).unwrap();
        let fragments = events_to_fragments(timed.events);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0], TranscriptFragment::new("hello there", 1.2, 2.5));
        assert_eq!(fragments[1].text, "general Kenobi");
        assert_eq!(fragments[1].start, 4.0);
    }
}
