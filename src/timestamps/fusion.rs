use crate::timestamps::silence::BoundaryCandidate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    pub min_segment_duration: f64,
    pub max_segments: usize,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            min_segment_duration: 20.0,
            max_segments: 12,
        }
    }
}

/// Millisecond precision; finer differences are treated as the same time.
fn round_ms(t: f64) -> f64 {
    (t * 1000.0).round() / 1000.0
}

/// Merge candidates from every source into ordered segment start times.
///
/// The first time is anchored at 0 so segments cover the whole video.
/// Later times are kept greedily when they are at least
/// `min_segment_duration` after the last kept one. When more than
/// `max_segments` remain they are down-sampled by a fixed stride and
/// truncated.
pub fn fuse_boundaries(candidates: &[BoundaryCandidate], params: &FusionParams) -> Vec<f64> {
    let max_segments = params.max_segments.max(1);

    let mut times: Vec<f64> = candidates
        .iter()
        .map(|c| round_ms(c.time))
        .filter(|t| t.is_finite())
        .collect();
    times.sort_by(f64::total_cmp);
    times.dedup();

    let Some(first) = times.first_mut() else {
        return vec![0.0];
    };
    *first = 0.0;

    let mut kept: Vec<f64> = Vec::with_capacity(times.len());
    for t in times {
        match kept.last() {
            None => kept.push(t),
            Some(&last) if t - last >= params.min_segment_duration => kept.push(t),
            Some(_) => {}
        }
    }

    if kept.len() > max_segments {
        let step = kept.len() / max_segments;
        tracing::debug!(
            "Capping {} boundaries to {} (stride {})",
            kept.len(),
            max_segments,
            step
        );
        if step > 1 {
            kept = kept.into_iter().step_by(step).collect();
        }
        if kept.first().is_some_and(|&t| t != 0.0) {
            kept.insert(0, 0.0);
        }
        kept.truncate(max_segments);
        kept.sort_by(f64::total_cmp);
    }

    kept
}
