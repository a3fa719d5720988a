use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("No captions available for video {video_id}")]
    TranscriptUnavailable { video_id: String },

    #[error("Transcript fetch failed for video {video_id}: {reason}")]
    TranscriptFetch { video_id: String, reason: String },

    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),

    #[error("Sentence tokenization failed: {0}")]
    Tokenization(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Similarity computation failed: {0}")]
    Similarity(String),

    #[error("Part-of-speech tagging failed: {0}")]
    Tagging(String),

    #[error("Keyword extraction failed: {0}")]
    KeywordExtraction(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Invalid segment id {segment_id} (video has {segment_count} segments)")]
    InvalidSegment {
        segment_id: usize,
        segment_count: usize,
    },

    #[error("No transcript text found for segment {segment_id}")]
    EmptySegment { segment_id: usize },

    #[error("Comment fetch failed for video {video_id}: {reason}")]
    CommentsFetch { video_id: String, reason: String },

    #[error("No comments found for video {video_id}")]
    NoComments { video_id: String },

    #[error("Encyclopedia lookup failed for '{term}': {reason}")]
    Encyclopedia { term: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl DigestError {
    /// True for the "no captions" case, as opposed to a transient failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::TranscriptUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;
