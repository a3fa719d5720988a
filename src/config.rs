use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timestamps: TimestampsConfig,
    pub transcript: TranscriptConfig,
    pub embeddings: EmbeddingsConfig,
    pub tagger: TaggerConfig,
    pub summarization: SummarizationConfig,
    pub encyclopedia: EncyclopediaConfig,
    pub comments: CommentsConfig,
}

/// Tunables for the segmentation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampsConfig {
    /// Minimum spacing between two kept boundaries, in seconds.
    pub min_segment_duration: f64,
    /// Upper bound on the number of segments returned.
    pub max_segments: usize,
    /// Gap (seconds) between fragments that counts as a pause.
    pub min_silence_duration: f64,
    /// Stricter gap (seconds) a pause needs before it becomes a boundary.
    pub silence_fusion_gap: f64,
    /// Sentences per window in topic-shift detection.
    pub window_size: usize,
    /// Window similarity below which a dip counts as a topic shift.
    pub similarity_threshold: f64,
    pub keywords_per_segment: usize,
    /// Interval floor used when the transcript yields no sentences.
    pub fallback_interval_secs: f64,
    pub fallback_max_segments: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// "youtube" (caption tracks) or "file" (JSON files in `directory`).
    pub source: String,
    pub directory: PathBuf,
    /// Preferred caption languages, most preferred first.
    pub languages: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// "tfidf" (local, no network) or "openai" (OpenAI-compatible endpoint).
    pub backend: String,
    pub endpoint: String,
    /// API key (or set YTDIGEST_EMBEDDINGS_KEY environment variable).
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for EmbeddingsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingsConfig")
            .field("backend", &self.backend)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Use the part-of-speech tagger for keyword and key-term extraction.
    /// When disabled, the frequency-based strategies are used directly.
    pub enabled: bool,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationConfig {
    /// OpenAI-compatible chat completions base URL. Empty = extractive only.
    pub endpoint: String,
    /// API key (or set YTDIGEST_SUMMARIZER_KEY environment variable).
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for SummarizationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizationConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncyclopediaConfig {
    /// Wikipedia host, without the language prefix.
    pub endpoint: String,
    pub language: String,
    pub max_summary_chars: usize,
    /// Pause between lookup batches to stay under rate limits.
    pub batch_delay_ms: u64,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// YouTube Data API key (or set YTDIGEST_YOUTUBE_KEY environment variable).
    pub api_key: String,
    pub max_comments: usize,
}

impl fmt::Debug for CommentsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentsConfig")
            .field("api_key", &"[REDACTED]")
            .field("max_comments", &self.max_comments)
            .finish()
    }
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            timestamps: TimestampsConfig::default(),
            transcript: TranscriptConfig::default(),
            embeddings: EmbeddingsConfig::default(),
            tagger: TaggerConfig::default(),
            summarization: SummarizationConfig::default(),
            encyclopedia: EncyclopediaConfig::default(),
            comments: CommentsConfig::default(),
        }
    }
}

impl Default for TimestampsConfig {
    fn default() -> Self {
        Self {
            min_segment_duration: 20.0,
            max_segments: 12,
            min_silence_duration: 1.0,
            silence_fusion_gap: 1.5,
            window_size: 3,
            similarity_threshold: 0.5,
            keywords_per_segment: 3,
            fallback_interval_secs: 60.0,
            fallback_max_segments: 8,
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        let directory = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ytdigest")
            .join("transcripts");
        Self {
            source: "youtube".to_string(),
            directory,
            languages: vec!["en".to_string()],
            timeout_secs: 30,
        }
    }
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            backend: "tfidf".to_string(),
            endpoint: String::new(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
        }
    }
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for EncyclopediaConfig {
    fn default() -> Self {
        Self {
            endpoint: "wikipedia.org".to_string(),
            language: "en".to_string(),
            max_summary_chars: 500,
            batch_delay_ms: 100,
        }
    }
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            max_comments: 1000,
        }
    }
}

// --- Config loading ---

impl Config {
    /// Load config and return the resolved file path (if any).
    pub fn load_with_path(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        // 1. Check explicit path
        if let Some(p) = path {
            let content = std::fs::read_to_string(p).map_err(|e| {
                anyhow::anyhow!("Failed to read config file {}: {}", p.display(), e)
            })?;
            let config: Config = toml::from_str(&content)?;
            return Ok((config, Some(p.to_path_buf())));
        }

        // 2. Check beside the executable
        if let Ok(exe_path) = std::env::current_exe() {
            let beside_exe = exe_path.parent().map(|p| p.join("ytdigest.toml"));
            if let Some(p) = beside_exe {
                if p.exists() {
                    let content = std::fs::read_to_string(&p)?;
                    let config: Config = toml::from_str(&content)?;
                    return Ok((config, Some(p)));
                }
            }
        }

        // 3. Check platform config directory (e.g. ~/.config/ytdigest/config.toml)
        if let Some(platform_config) = Self::platform_path() {
            if platform_config.exists() {
                let content = std::fs::read_to_string(&platform_config)?;
                let config: Config = toml::from_str(&content)?;
                return Ok((config, Some(platform_config)));
            }
        }

        // 4. Fall back to defaults
        tracing::info!("No config file found, using defaults");
        Ok((Config::default(), None))
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    /// `<platform config dir>/ytdigest/config.toml`
    pub fn platform_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ytdigest").join("config.toml"))
    }

    /// Generate a default config file with all fields and inline documentation.
    pub fn generate_default_commented() -> String {
        let default_dir = TranscriptConfig::default().directory;
        let dir_str = default_dir.to_string_lossy().replace('\\', "\\\\");

        format!(
r#"# ytdigest configuration

[timestamps]
# Minimum length of a segment in seconds. Boundaries closer than this to the
# previous kept boundary are dropped.
min_segment_duration = 20.0
# Maximum number of segments per video.
max_segments = 12
# Gap between caption fragments (seconds) that counts as a pause.
min_silence_duration = 1.0
# Pauses must be at least this long (seconds) to become segment boundaries.
silence_fusion_gap = 1.5
# Sentences per comparison window in topic-shift detection.
window_size = 3
# Window similarity below which a local dip marks a topic shift (0.0 to 1.0).
similarity_threshold = 0.5
# Keywords attached to each segment.
keywords_per_segment = 3
# Used when the transcript has no sentence punctuation at all: segments are
# laid out every max(fallback_interval_secs, duration / 8) seconds.
fallback_interval_secs = 60.0
fallback_max_segments = 8

[transcript]
# Transcript source: "youtube" (caption tracks) or "file" (JSON files).
source = "youtube"
# Directory holding <video_id>.json files for the "file" source.
directory = "{dir}"
# Preferred caption languages, most preferred first.
languages = ["en"]
# HTTP timeout in seconds.
timeout_secs = 30

[embeddings]
# Sentence embedding backend: "tfidf" (local) or "openai" (remote endpoint).
backend = "tfidf"
# OpenAI-compatible base URL, e.g. "https://api.openai.com/v1".
# endpoint = ""
# API key (or set YTDIGEST_EMBEDDINGS_KEY environment variable).
# api_key = ""
model = "text-embedding-3-small"

[tagger]
# Part-of-speech tagging for keyword extraction. Disable to use word
# frequency only.
enabled = true

[summarization]
# OpenAI-compatible base URL for chat completions. Leave empty to use the
# built-in extractive summarizer.
# endpoint = "https://api.openai.com/v1"
# API key (or set YTDIGEST_SUMMARIZER_KEY environment variable).
# api_key = ""
model = "gpt-4o-mini"
timeout_secs = 120

[encyclopedia]
# Wikipedia host and language used for key-term lookups.
endpoint = "wikipedia.org"
language = "en"
# Article summaries are cut to this many characters.
max_summary_chars = 500
# Pause between lookup batches in milliseconds.
batch_delay_ms = 100

[comments]
# YouTube Data API v3 key (or set YTDIGEST_YOUTUBE_KEY environment variable).
# api_key = ""
# Stop paging after this many comments.
max_comments = 1000
"#,
            dir = dir_str
        )
    }
}

/// Pick the configured key, else the named environment variable.
pub fn resolve_api_key(configured: &str, env_var: &str) -> Option<String> {
    if !configured.is_empty() {
        return Some(configured.to_string());
    }
    std::env::var(env_var).ok().filter(|v| !v.is_empty())
}
