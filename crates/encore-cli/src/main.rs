//! Encore CLI: process, upload and manage audio files.
//!
//! Reads configuration from the environment (and `.env`). Commands other than
//! `process` need DATABASE_URL.

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use encore_cli::{content_type_for_path, init_tracing};
use chrono::NaiveDate;
use encore_core::models::{UploadProgress, VersionType};
use encore_core::{format_duration, format_file_size, Config};
use encore_ingest::{
    build_orchestrator, BatchCoordinator, ChannelProgress, UploadOrchestrator, UploadRequest,
};
use encore_processing::{AudioProcessing, AudioValidator, ProcessingOptions, SignalProcessor};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "encore", about = "Audio ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a file locally and print its metadata (no storage, no database)
    Process {
        /// Input audio file
        file: PathBuf,
        /// Write the encoded MP3 here
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip loudness normalization
        #[arg(long)]
        no_normalize: bool,
        /// Fade-in duration in seconds
        #[arg(long, default_value = "0")]
        fade_in: f32,
        /// Fade-out duration in seconds
        #[arg(long, default_value = "0")]
        fade_out: f32,
        /// Maximum bitrate in kbps
        #[arg(long)]
        bitrate: Option<u32>,
    },
    /// Upload one or more files for an owner
    Upload {
        /// Files to upload, processed in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Owner (quota account) UUID
        #[arg(long)]
        owner: Uuid,
        /// Title for a single file; defaults to the file name
        #[arg(long)]
        title: Option<String>,
        /// voice_memo, rough_demo, rehearsal, working_mix, final, live or other
        #[arg(long, default_value = "other")]
        version_type: VersionType,
        /// Date the recording was made (YYYY-MM-DD)
        #[arg(long)]
        recording_date: Option<NaiveDate>,
    },
    /// Delete an uploaded record, its stored object and its quota usage
    Delete {
        /// Record UUID
        id: Uuid,
    },
    /// Quota account operations
    Quota {
        #[command(subcommand)]
        sub: QuotaCommands,
    },
    /// Upload totals for an owner
    Stats {
        /// Owner UUID
        owner: Uuid,
    },
    /// List an owner's uploads, newest first
    List {
        /// Owner UUID
        owner: Uuid,
        /// Maximum number of items
        #[arg(long, default_value = "20")]
        limit: i64,
        /// Offset for pagination
        #[arg(long, default_value = "0")]
        offset: i64,
    },
}

#[derive(Subcommand)]
enum QuotaCommands {
    /// Show usage and limit
    Show {
        /// Account UUID
        owner: Uuid,
    },
    /// Create an account if it does not exist
    Open {
        /// Account UUID
        owner: Uuid,
        /// Limit in bytes (defaults to DEFAULT_QUOTA_LIMIT_BYTES)
        #[arg(long)]
        limit: Option<i64>,
    },
}

#[derive(Serialize)]
struct QuotaView {
    account_id: Uuid,
    used_bytes: i64,
    limit_bytes: i64,
    remaining_bytes: i64,
    used: String,
    limit: String,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn read_file(path: &Path) -> anyhow::Result<Bytes> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Bytes::from(data))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

async fn orchestrator(config: &Config) -> anyhow::Result<UploadOrchestrator> {
    let pool = encore_db::setup_database(config).await?;
    build_orchestrator(config, pool).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.is_production());
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Process {
            file,
            output,
            no_normalize,
            fade_in,
            fade_out,
            bitrate,
        } => {
            let data = read_file(&file).await?;
            let filename = file_name(&file);
            AudioValidator::from_config(&config).validate_all(
                &filename,
                content_type_for_path(&file),
                data.len(),
            )?;

            let mut options = ProcessingOptions::from_config(&config).with_fades(fade_in, fade_out);
            options.normalize = !no_normalize;
            if let Some(kbps) = bitrate {
                options.max_bitrate_kbps = kbps;
            }

            let extension = AudioValidator::extension_of(&filename);
            let asset = tokio::task::spawn_blocking(move || {
                SignalProcessor::new().process(data, extension.as_deref(), &options)
            })
            .await
            .context("Processing task failed")??;

            if let Some(path) = output {
                tokio::fs::write(&path, &asset.encoded)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            print_json(&serde_json::json!({
                "metadata": asset.metadata,
                "encoded_bitrate_kbps": asset.encoded_bitrate_kbps,
                "original_size": format_file_size(asset.original_size_bytes()),
                "encoded_size": format_file_size(asset.encoded_size_bytes()),
                "duration": format_duration(asset.metadata.duration_seconds),
            }))?;
        }
        Commands::Upload {
            files,
            owner,
            title,
            version_type,
            recording_date,
        } => {
            let orchestrator = Arc::new(orchestrator(&config).await?);

            let single = files.len() == 1;
            let mut requests = Vec::with_capacity(files.len());
            for path in &files {
                let mut request = UploadRequest::new(
                    owner,
                    file_name(path),
                    content_type_for_path(path),
                    read_file(path).await?,
                )
                .with_version_type(version_type);
                if let Some(date) = recording_date {
                    request = request.with_recording_date(date);
                }
                if single {
                    if let Some(ref title) = title {
                        request = request.with_title(title.clone());
                    }
                }
                requests.push(request);
            }

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<UploadProgress>();
            let printer = tokio::spawn(async move {
                while let Some(progress) = rx.recv().await {
                    match progress.error {
                        Some(ref error) => eprintln!(
                            "[{:>3}%] {}: {}",
                            progress.progress_percent, progress.message, error
                        ),
                        None => {
                            eprintln!("[{:>3}%] {}", progress.progress_percent, progress.message)
                        }
                    }
                }
            });

            let observer = ChannelProgress::new(tx);
            let result = BatchCoordinator::new(orchestrator)
                .upload_many(requests, &observer)
                .await;
            drop(observer);
            printer.await.context("Progress printer failed")?;

            print_json(&result)?;
            if !result.is_complete_success() {
                anyhow::bail!(result.summary());
            }
        }
        Commands::Delete { id } => {
            let report = orchestrator(&config).await?.delete_one(id).await?;
            print_json(&report)?;
        }
        Commands::Quota { sub } => {
            let orchestrator = orchestrator(&config).await?;
            let account = match sub {
                QuotaCommands::Show { owner } => orchestrator.ledger().account(owner).await?,
                QuotaCommands::Open { owner, limit } => {
                    let limit = limit.unwrap_or_else(|| config.default_quota_limit_bytes());
                    orchestrator.ledger().open_account(owner, limit).await?
                }
            };
            print_json(&QuotaView {
                account_id: account.account_id,
                used_bytes: account.used_bytes,
                limit_bytes: account.limit_bytes,
                remaining_bytes: account.remaining_bytes(),
                used: format_file_size(account.used_bytes),
                limit: format_file_size(account.limit_bytes),
            })?;
        }
        Commands::Stats { owner } => {
            let stats = orchestrator(&config).await?.upload_stats(owner).await?;
            print_json(&serde_json::json!({
                "total_files": stats.total_files,
                "total_size_bytes": stats.total_size_bytes,
                "total_duration_seconds": stats.total_duration_seconds,
                "total_size": format_file_size(stats.total_size_bytes),
                "total_duration": format_duration(stats.total_duration_seconds),
                "estimated_compression_savings_bytes": stats.estimated_compression_savings_bytes,
                "estimated_compression_savings": format_file_size(stats.estimated_compression_savings_bytes),
            }))?;
        }
        Commands::List {
            owner,
            limit,
            offset,
        } => {
            let records = orchestrator(&config)
                .await?
                .list(owner, limit, offset)
                .await?;
            print_json(&records)?;
        }
    }

    Ok(())
}
