//! Batch subtitle pipeline binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use transx_models::TargetLanguages;
use transx_worker::discovery::discover;
use transx_worker::{Pipeline, PipelineConfig, PipelineServices};

/// Transcribe and translate every video under a directory into subtitle files.
#[derive(Debug, Parser)]
#[command(name = "transx", version, about)]
struct Args {
    /// Directory to scan for videos
    #[arg(long, env = "TRANSX_PATH")]
    path: Option<PathBuf>,

    /// Bucket for uploads and job output (generated when omitted)
    #[arg(long, env = "TRANSX_BUCKET_NAME")]
    bucket_name: Option<String>,

    /// Comma-separated target language codes
    #[arg(long, env = "TRANSX_TARGET_LANGUAGES")]
    target_languages: Option<String>,

    /// Language spoken in the videos
    #[arg(long, env = "TRANSX_SOURCE_LANGUAGE")]
    source_language: Option<String>,

    /// Upload every video even when the bucket already holds an identical copy
    #[arg(long, global = true)]
    force: bool,

    /// Print the report as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload, transcribe, translate and download subtitles (default)
    Run,
    /// List the videos a run would process
    Ls,
    /// Delete generated subtitles and job info files
    Clean {
        /// Also delete every object in the bucket and the bucket itself
        #[arg(long)]
        remote: bool,
    },
}

impl Args {
    fn apply(&mut self, mut config: PipelineConfig) -> anyhow::Result<PipelineConfig> {
        if let Some(path) = self.path.take() {
            config.input_dir = path;
        }
        if let Some(bucket) = self.bucket_name.take() {
            config.bucket_name = bucket;
        }
        if let Some(list) = self.target_languages.take() {
            config.target_languages = TargetLanguages::parse_list(&list)
                .with_context(|| format!("invalid target languages {:?}", list))?;
        }
        if let Some(language) = self.source_language.take() {
            config.source_language = language;
        }
        config.force_upload |= self.force;
        Ok(config)
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("transx=info,transx_worker=info,transx_storage=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(mut args: Args) -> anyhow::Result<()> {
    if matches!(args.command, Some(Command::Clean { remote: true })) && args.bucket_name.is_none() {
        anyhow::bail!("clean --remote needs --bucket-name or TRANSX_BUCKET_NAME");
    }
    let config = args.apply(PipelineConfig::from_env()?)?;
    let command = args.command.unwrap_or(Command::Run);

    if let Command::Ls = command {
        let items = discover(&config.input_dir, &config.media_extension)?;
        for item in &items {
            println!("{}", item);
        }
        info!("[{}] videos found", items.len());
        return Ok(());
    }

    info!(
        path = %config.input_dir.display(),
        bucket = %config.bucket_name,
        languages = %config.target_languages,
        "Starting transx"
    );

    let services = PipelineServices::aws().await;
    let pipeline = Pipeline::new(config, services);

    let cancel = pipeline.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, cancelling run");
            cancel.cancel();
        }
    });

    if let Command::Clean { remote } = command {
        let report = pipeline.clean(remote).await?;
        info!(
            files = report.files_removed.len(),
            objects = report.objects_removed,
            bucket_removed = report.bucket_removed,
            "Clean done"
        );
        if args.json {
            print_json(&report)?;
        }
        return Ok(());
    }

    let report = pipeline.run().await?;
    for skipped in &report.skipped {
        warn!("{}", skipped);
    }

    if args.json {
        print_json(&report)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("transx failed: {:#}", e);
        std::process::exit(1);
    }
}
