use serde::Serialize;

use crate::transcript::TranscriptFragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundarySource {
    Silence,
    Topic,
}

/// A proposed segment start, before fusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundaryCandidate {
    pub time: f64,
    pub source: BoundarySource,
}

impl BoundaryCandidate {
    pub fn topic(time: f64) -> Self {
        Self {
            time,
            source: BoundarySource::Topic,
        }
    }
}

/// A pause between two fragments, placed at the start of the later one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SilenceGap {
    pub time: f64,
    pub duration: f64,
}

impl SilenceGap {
    pub fn candidate(&self) -> BoundaryCandidate {
        BoundaryCandidate {
            time: self.time,
            source: BoundarySource::Silence,
        }
    }
}

/// Every gap of at least `min_silence_duration` seconds between one
/// fragment's end and the next fragment's start.
pub fn detect_silences(
    fragments: &[TranscriptFragment],
    min_silence_duration: f64,
) -> Vec<SilenceGap> {
    fragments
        .windows(2)
        .filter_map(|pair| {
            let gap = pair[1].start - pair[0].end();
            (gap >= min_silence_duration).then_some(SilenceGap {
                time: pair[1].start,
                duration: gap,
            })
        })
        .collect()
}

/// Silence gaps long enough to become segment boundaries.
pub fn silence_candidates(gaps: &[SilenceGap], fusion_gap: f64) -> Vec<BoundaryCandidate> {
    gaps.iter()
        .filter(|g| g.duration >= fusion_gap)
        .map(SilenceGap::candidate)
        .collect()
}
