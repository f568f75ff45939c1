//! mediaconv: command-line client for the media conversion service.
//!
//! Set MEDIACONV_BACKEND_URL (or BACKEND_URL); defaults to http://localhost:8000.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mediaconv_api_client::ApiClient;
use mediaconv_cli::{finish, init_tracing, render_formats_table, write_artifact, ConsoleFeedback};
use mediaconv_core::models::{FormatTag, InputFile};
use mediaconv_core::ClientConfig;
use mediaconv_orchestrator::ConversionOrchestrator;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mediaconv", about = "Convert media files with a remote conversion service")]
struct Cli {
    /// Base URL of the conversion service
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Per-request timeout in seconds (0 disables it)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the formats the service supports, grouped by media family
    Formats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the target formats every given file can be converted to
    Targets {
        /// Files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert files and save the result
    Convert {
        /// Files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target format, e.g. jpg
        #[arg(long)]
        to: String,
        /// Directory to save the result in
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct SavedArtifact {
    path: PathBuf,
    bytes: usize,
    content_type: Option<String>,
    archive: bool,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn load_files(paths: &[PathBuf]) -> anyhow::Result<Vec<InputFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = InputFile::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    finish(run(cli).await, &mut std::io::stderr())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env().context("Failed to load configuration")?;
    if let Some(url) = cli.backend_url.as_deref() {
        config = config.with_backend_url(url)?;
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }

    let client = Arc::new(
        ApiClient::from_config(&config).context(
            "Failed to create API client. Set MEDIACONV_BACKEND_URL (or BACKEND_URL)",
        )?,
    );
    let mut orchestrator =
        ConversionOrchestrator::new(client).with_feedback(Arc::new(ConsoleFeedback::stderr()));

    match cli.command {
        Commands::Formats { json } => {
            let formats = orchestrator.supported_formats().await?;
            if json {
                print_json(&formats)?;
            } else {
                print!("{}", render_formats_table(&formats));
            }
        }
        Commands::Targets { files } => {
            let files = load_files(&files).await?;
            let negotiation = orchestrator.select_files(&files).await?;
            let targets: Vec<&FormatTag> = negotiation
                .targets()
                .map(|set| set.iter().collect())
                .unwrap_or_default();
            print_json(&serde_json::json!({ "targets": targets }))?;
        }
        Commands::Convert { files, to, output } => {
            let files = load_files(&files).await?;
            let to = FormatTag::parse(&to);
            orchestrator.select_files(&files).await?;
            let artifact = orchestrator.convert(&files, &to).await?;

            let dir = output.unwrap_or_else(|| config.output_dir.clone());
            let path = write_artifact(&dir, &artifact).await?;
            print_json(&SavedArtifact {
                path,
                bytes: artifact.len(),
                archive: artifact.is_archive(),
                content_type: artifact.content_type.clone(),
            })?;
        }
    }

    Ok(())
}
