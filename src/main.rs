mod cli;
mod commands;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands};
use ytdigest::config::Config;
use ytdigest::keyterms::wikipedia::WikipediaClient;
use ytdigest::models::ModelRegistry;
use ytdigest::sentiment::comments::YouTubeCommentsClient;
use ytdigest::sentiment::lexicon::LexiconClassifier;
use ytdigest::summarize::build_summarizer;
use ytdigest::transcript::build_source;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ytdigest=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::InitConfig { force } = cli.command {
        let path = commands::init_config(cli.config.as_deref(), force)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.transcripts_dir {
        config.transcript.directory = dir;
    }
    let source = build_source(&config, cli.source.as_deref())?;
    tracing::info!("Transcript source: {}", source.name());

    match cli.command {
        Commands::Timestamps {
            video,
            min_segment_duration,
            max_segments,
        } => {
            let video_id = commands::resolve_video(&video)?;
            let mut params = config.timestamps.clone();
            if let Some(d) = min_segment_duration {
                params.min_segment_duration = d;
            }
            if let Some(m) = max_segments {
                params.max_segments = m;
            }
            let registry = ModelRegistry::from_config(&config)?;
            commands::respond(
                &video_id,
                commands::timestamps(&registry, source.as_ref(), &video_id, &params),
            )
        }
        Commands::SegmentTranscript { video, start, end } => {
            let video_id = commands::resolve_video(&video)?;
            commands::respond(
                &video_id,
                commands::segment_transcript(source.as_ref(), &video_id, start, end),
            )
        }
        Commands::SegmentSummary { video, segment_id } => {
            let video_id = commands::resolve_video(&video)?;
            let registry = ModelRegistry::from_config(&config)?;
            let summarizer = build_summarizer(&config)?;
            commands::respond(
                &video_id,
                commands::segment_summary(
                    &registry,
                    summarizer.as_ref(),
                    source.as_ref(),
                    &video_id,
                    segment_id,
                    &config.timestamps,
                ),
            )
        }
        Commands::Summarize {
            video,
            min_length,
            max_length,
        } => {
            let video_id = commands::resolve_video(&video)?;
            let summarizer = build_summarizer(&config)?;
            commands::respond(
                &video_id,
                commands::summarize(
                    summarizer.as_ref(),
                    source.as_ref(),
                    &video_id,
                    min_length,
                    max_length,
                ),
            )
        }
        Commands::KeyPoints { video } => {
            let video_id = commands::resolve_video(&video)?;
            let summarizer = build_summarizer(&config)?;
            commands::respond(
                &video_id,
                commands::key_points_for(summarizer.as_ref(), source.as_ref(), &video_id),
            )
        }
        Commands::KeyTerms { video, num_terms } => {
            let video_id = commands::resolve_video(&video)?;
            let registry = ModelRegistry::from_config(&config)?;
            let encyclopedia = WikipediaClient::from_config(&config.encyclopedia)?;
            commands::respond(
                &video_id,
                commands::key_terms(
                    &registry,
                    &encyclopedia,
                    source.as_ref(),
                    &video_id,
                    num_terms,
                    Duration::from_millis(config.encyclopedia.batch_delay_ms),
                ),
            )
        }
        Commands::Sentiment { video } => {
            let video_id = commands::resolve_video(&video)?;
            let comments = YouTubeCommentsClient::from_config(&config.comments)?;
            commands::respond(
                &video_id,
                commands::sentiment(&comments, &LexiconClassifier::default(), &video_id),
            )
        }
        Commands::InitConfig { .. } => Ok(()),
    }
}
