pub mod comments;
pub mod lexicon;

use serde::{Deserialize, Serialize};

use crate::error::{DigestError, Result};

/// Comments are cut to this many words before classification.
pub const MAX_COMMENT_WORDS: usize = 128;
const SAMPLE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// Anything that can list the top-level comments of a video.
pub trait CommentSource: Send + Sync {
    fn name(&self) -> &str;
    fn fetch_comments(&self, video_id: &str) -> Result<Vec<String>>;
}

pub trait SentimentClassifier: Send + Sync {
    fn name(&self) -> &str;
    fn classify(&self, text: &str) -> Result<SentimentLabel>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub positive_percentage: f64,
    pub negative_percentage: f64,
    pub total_comments: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentSentiment {
    pub video_id: String,
    pub sentiment: SentimentReport,
    pub comments_sample: Vec<String>,
}

/// First `max_words` whitespace-separated words of `text`.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        words[..max_words].join(" ")
    } else {
        text.to_string()
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = count as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Share of positive and negative labels, in percent to two decimals.
pub fn aggregate(labels: &[SentimentLabel]) -> SentimentReport {
    let total = labels.len();
    let positive = labels.iter().filter(|&&l| l == SentimentLabel::Positive).count();
    let negative = labels.iter().filter(|&&l| l == SentimentLabel::Negative).count();
    SentimentReport {
        positive_percentage: percentage(positive, total),
        negative_percentage: percentage(negative, total),
        total_comments: total,
    }
}

/// Fetch a video's comments and summarize how they feel about it.
pub fn analyze_comments(
    source: &dyn CommentSource,
    classifier: &dyn SentimentClassifier,
    video_id: &str,
) -> Result<CommentSentiment> {
    let comments = source.fetch_comments(video_id)?;
    if comments.is_empty() {
        return Err(DigestError::NoComments {
            video_id: video_id.to_string(),
        });
    }
    tracing::info!(
        "Classifying {} comments with {}",
        comments.len(),
        classifier.name()
    );

    let labels = comments
        .iter()
        .map(|c| classifier.classify(&truncate_words(c, MAX_COMMENT_WORDS)))
        .collect::<Result<Vec<_>>>()?;

    Ok(CommentSentiment {
        video_id: video_id.to_string(),
        sentiment: aggregate(&labels),
        comments_sample: comments.into_iter().take(SAMPLE_SIZE).collect(),
    })
}
