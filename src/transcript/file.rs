use std::path::PathBuf;

use crate::error::{DigestError, Result};
use crate::transcript::{TranscriptFragment, TranscriptSource};

/// Reads `<directory>/<video_id>.json`, a JSON array of
/// `{"text", "start", "duration"}` objects.
pub struct FileTranscriptSource {
    directory: PathBuf,
}

impl FileTranscriptSource {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }
}

impl TranscriptSource for FileTranscriptSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptFragment>> {
        let path = self.directory.join(format!("{}.json", video_id));
        if !path.exists() {
            tracing::debug!("No transcript file at {}", path.display());
            return Err(DigestError::TranscriptUnavailable {
                video_id: video_id.to_string(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let mut fragments: Vec<TranscriptFragment> =
            serde_json::from_str(&content).map_err(|e| DigestError::TranscriptFetch {
                video_id: video_id.to_string(),
                reason: format!("{}: {}", path.display(), e),
            })?;

        // Hand-edited files are not always in order.
        fragments.sort_by(|a, b| a.start.total_cmp(&b.start));
        Ok(fragments)
    }
}
