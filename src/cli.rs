use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ytdigest",
    version,
    about = "Topic timestamps, summaries, key terms and comment sentiment for YouTube videos"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Transcript source (youtube or file)
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Directory of <video_id>.json transcripts for the file source
    #[arg(long, global = true)]
    pub transcripts_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate topic-based timestamps for a video
    Timestamps {
        /// Video id or URL
        video: String,

        /// Override the minimum segment length in seconds
        #[arg(long)]
        min_segment_duration: Option<f64>,

        /// Override the maximum number of segments
        #[arg(long)]
        max_segments: Option<usize>,
    },

    /// Print the transcript text between two times
    SegmentTranscript {
        /// Video id or URL
        video: String,

        /// Start time in seconds
        #[arg(long)]
        start: f64,

        /// End time in seconds (defaults to the end of the video)
        #[arg(long)]
        end: Option<f64>,
    },

    /// Summarize one timestamp segment
    SegmentSummary {
        /// Video id or URL
        video: String,

        /// Segment id from the timestamps output
        segment_id: usize,
    },

    /// Summarize a whole video
    Summarize {
        /// Video id or URL
        video: String,

        #[arg(long, default_value_t = 150)]
        min_length: usize,

        #[arg(long, default_value_t = 300)]
        max_length: usize,
    },

    /// List the key points of a video's summary
    KeyPoints {
        /// Video id or URL
        video: String,
    },

    /// Extract key terms with Wikipedia summaries
    KeyTerms {
        /// Video id or URL
        video: String,

        #[arg(long, default_value_t = 8)]
        num_terms: usize,
    },

    /// Classify the sentiment of a video's comments
    Sentiment {
        /// Video id or URL
        video: String,
    },

    /// Write a documented default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
