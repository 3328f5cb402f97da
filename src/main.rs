use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use tokio::sync::mpsc;

use storyreel::models::ProgressUpdate;
use storyreel::utils::logger::init_logger;
use storyreel::{AppConfig, Story, StoryPipeline};

#[derive(Parser, Debug)]
#[command(name = "storyreel")]
#[command(about = "Turn a story script into narrated scene images, an interactive bundle and a video", long_about = None)]
struct Args {
    /// Story script (JSON)
    story: PathBuf,

    /// Story title, used for output file names
    #[arg(short, long)]
    title: Option<String>,

    /// Comma separated formats: json, html, video, epub
    #[arg(short, long, value_delimiter = ',')]
    formats: Vec<String>,

    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the output root directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Probe every configured provider and exit
    #[arg(long)]
    check_providers: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logger();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let raw = tokio::fs::read_to_string(&args.story)
        .await
        .with_context(|| format!("Failed to read story: {}", args.story.display()))?;
    let story: Story = serde_json::from_str(&raw).context("Story script is not valid JSON")?;

    let title = args
        .title
        .or_else(|| story.metadata.as_ref().and_then(|m| m.title.clone()))
        .unwrap_or_else(|| "story".to_string());
    let formats = if args.formats.is_empty() {
        config.compiler.default_formats.clone()
    } else {
        args.formats
    };

    let pipeline = StoryPipeline::from_config(config);

    if args.check_providers {
        let mut health = pipeline.image_generator().health_check().await;
        health.extend(pipeline.speech_generator().health_check().await);
        println!("{}", serde_json::to_string_pretty(&health)?);
        return Ok(());
    }

    let (tx, mut rx) = mpsc::channel::<ProgressUpdate>(64);
    let progress_task = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            match update {
                ProgressUpdate::AssetFinished {
                    kind,
                    completed,
                    total,
                    ..
                } => info!("{} {}/{}", kind.label(), completed, total),
                ProgressUpdate::FormatFinished { format, success } => {
                    info!("{}: {}", format, if success { "done" } else { "failed" })
                }
                _ => {}
            }
        }
    });

    let report = pipeline.run_with_report(&story, &title, &formats, Some(tx)).await;
    if let Err(e) = progress_task.await {
        error!("Progress reporter stopped: {}", e);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.result.success {
        std::process::exit(1);
    }
    Ok(())
}
