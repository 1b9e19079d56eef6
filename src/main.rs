//! repo-version - Deterministic versions for git-repo manifests
//!
//! Main entry point for the repo-version CLI. Results go to stdout, all
//! diagnostics to stderr.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use repo_version::config::{validate_source_result, CheckRequest, SourceConfig};
use repo_version::resolver::{GitCliLister, RevisionResolver};
use repo_version::version::{canonicalize_str, VersionEntry};
use repo_version::{logging, VersionStore};
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// repo-version - Comparable versions for git-repo manifests
#[derive(Parser, Debug)]
#[command(name = "repo-version")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/repo-version/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the current manifest version
    Version {
        #[command(flatten)]
        source: SourceArgs,

        /// Print per-project revisions as JSON instead of the version
        #[arg(long)]
        metadata: bool,
    },

    /// Read known versions as JSON on stdin and print them, oldest first,
    /// with the current version appended when it is new
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the canonical form of a manifest snapshot
    Canonicalize {
        /// Snapshot file (default: stdin)
        file: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Manifest repository URL
    #[arg(short, long, env = "REPO_VERSION_URL")]
    url: Option<String>,

    /// Manifest file name
    #[arg(short, long)]
    name: Option<String>,

    /// Concurrent revision lookups
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Directory holding the manifest checkout (default: <workdir>/.repo/manifests)
    #[arg(long)]
    manifest_dir: Option<PathBuf>,

    /// repo work directory
    #[arg(short, long, default_value = ".")]
    workdir: PathBuf,
}

impl SourceArgs {
    /// Layer command-line values over a base configuration
    fn apply(&self, mut config: SourceConfig) -> SourceConfig {
        if let Some(ref url) = self.url {
            config.url = url.clone();
        }
        if let Some(ref name) = self.name {
            config.name = name.clone();
        }
        if let Some(jobs) = self.jobs {
            config.check_jobs = jobs;
        }
        if let Some(ref dir) = self.manifest_dir {
            config.manifest_dir = Some(dir.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Version { source, metadata } => {
            let config = source.apply(base_config(cli.config.as_ref())?);
            let store = build_store(&config, &source)?;

            let resolved = store.compute_version(&config.name).await?;
            if metadata {
                println!("{}", serde_json::to_string(&resolved.projects)?);
            } else {
                println!("{}", resolved.version);
            }
        }
        Commands::Check { source } => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read check request from stdin")?;
            let request = if input.trim().is_empty() {
                CheckRequest::default()
            } else {
                CheckRequest::from_json(&input).context("Invalid check request")?
            };

            let base = match request.source.clone() {
                Some(config) => config,
                None => base_config(cli.config.as_ref())?,
            };
            let config = source.apply(base);
            let store = build_store(&config, &source)?;

            let versions = store.check(&config.name, request.history()).await?;
            let entries: Vec<VersionEntry> = versions.into_iter().map(VersionEntry::from).collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
        Commands::Canonicalize { file } => {
            let xml = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut input = String::new();
                    std::io::stdin().read_to_string(&mut input)?;
                    input
                }
            };
            println!("{}", canonicalize_str(&xml)?);
        }
    }

    Ok(())
}

/// Configuration from `--config`, the default file when present, or an
/// empty source to be filled in from flags
fn base_config(path: Option<&PathBuf>) -> anyhow::Result<SourceConfig> {
    match path {
        Some(path) => Ok(SourceConfig::load(path)?),
        None if SourceConfig::default_path().exists() => Ok(SourceConfig::load_default()?),
        None => Ok(SourceConfig::new("")),
    }
}

fn build_store(config: &SourceConfig, source: &SourceArgs) -> anyhow::Result<VersionStore> {
    validate_source_result(config)?;

    let loader = config.loader(&source.workdir);
    tracing::debug!(
        root = %loader.root().display(),
        revision = %config.revision,
        "Using manifest checkout"
    );

    let lister = GitCliLister::new().context("git is required to resolve revisions")?;
    let resolver =
        RevisionResolver::new(Arc::new(lister)).with_jobs(config.effective_check_jobs());

    Ok(VersionStore::new(Arc::new(loader), resolver, config.url.clone())
        .with_max_include_depth(config.max_include_depth))
}
