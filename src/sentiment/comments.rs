use std::time::Duration;

use serde::Deserialize;

use crate::config::{resolve_api_key, CommentsConfig};
use crate::error::{DigestError, Result};
use crate::sentiment::CommentSource;

const COMMENT_THREADS_URL: &str = "https://www.googleapis.com/youtube/v3/commentThreads";
const PAGE_SIZE: &str = "100";
const TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadPage {
    #[serde(default)]
    items: Vec<Thread>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thread {
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_display: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    reason: String,
}

impl ThreadPage {
    fn texts(self) -> impl Iterator<Item = String> {
        self.items
            .into_iter()
            .map(|t| t.snippet.top_level_comment.snippet.text_display)
    }
}

/// Top-level comments from the YouTube Data API v3.
pub struct YouTubeCommentsClient {
    api_key: String,
    max_comments: usize,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for YouTubeCommentsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeCommentsClient")
            .field("api_key", &"[REDACTED]")
            .field("max_comments", &self.max_comments)
            .finish()
    }
}

impl YouTubeCommentsClient {
    /// The API key falls back to YTDIGEST_YOUTUBE_KEY.
    pub fn from_config(config: &CommentsConfig) -> anyhow::Result<Self> {
        let api_key = resolve_api_key(&config.api_key, "YTDIGEST_YOUTUBE_KEY").ok_or_else(|| {
            anyhow::anyhow!(
                "YouTube API key not configured. \
                 Set [comments] api_key or YTDIGEST_YOUTUBE_KEY"
            )
        })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            api_key,
            max_comments: config.max_comments.max(1),
            client,
        })
    }

    fn fetch_page(&self, video_id: &str, page_token: Option<&str>) -> Result<Option<ThreadPage>> {
        let mut query = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("textFormat", "plainText"),
            ("maxResults", PAGE_SIZE),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self.client.get(COMMENT_THREADS_URL).query(&query).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(Some(response.json()?));
        }

        let body = response.text().unwrap_or_default();
        match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) if parsed.error.errors.iter().any(|e| e.reason == "commentsDisabled") => {
                tracing::info!("Comments are disabled for {}", video_id);
                Ok(None)
            }
            Ok(parsed) => Err(DigestError::CommentsFetch {
                video_id: video_id.to_string(),
                reason: format!("HTTP {}: {}", status.as_u16(), parsed.error.message),
            }),
            Err(_) => Err(DigestError::CommentsFetch {
                video_id: video_id.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            }),
        }
    }
}

impl CommentSource for YouTubeCommentsClient {
    fn name(&self) -> &str {
        "youtube"
    }

    fn fetch_comments(&self, video_id: &str) -> Result<Vec<String>> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let Some(page) = self.fetch_page(video_id, page_token.as_deref())? else {
                break;
            };
            page_token = page.next_page_token.clone();
            comments.extend(page.texts());
            tracing::debug!("Fetched {} comments so far", comments.len());

            if comments.len() >= self.max_comments || page_token.is_none() {
                break;
            }
        }

        comments.truncate(self.max_comments);
        tracing::info!("Fetched {} comments for {}", comments.len(), video_id);
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_page_parses() {
        let json = r#"{
            "nextPageToken": "QURTSl",
            "items": [
                {"snippet": {"topLevelComment": {"snippet": {"textDisplay": "Nice one", "likeCount": 3}}}},
                {"snippet": {"topLevelComment": {"snippet": {"textDisplay": "Thanks"}}}}
            ]
        }"#;
        let page: ThreadPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("QURTSl"));
        assert_eq!(page.texts().collect::<Vec<_>>(), vec!["Nice one", "Thanks"]);
    }

    #[test]
    fn test_last_page_has_no_token() {
        let page: ThreadPage = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_error_body_parses_reason() {
        let json = r#"{"error": {"code": 403, "message": "disabled comments",
                       "errors": [{"reason": "commentsDisabled", "domain": "youtube.commentThread"}]}}"#;
        let parsed: ApiErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.error.errors[0].reason, "commentsDisabled");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = CommentsConfig {
            api_key: "secret-key".to_string(),
            ..Default::default()
        };
        let client = YouTubeCommentsClient::from_config(&config).unwrap();
        let debug_output = format!("{:?}", client);
        assert!(!debug_output.contains("secret-key"));
    }
}
