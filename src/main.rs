mod cli;

use anyhow::Context;
use asset_ref_index::adapters::outbound::console::{StderrProgressReporter, TextRenderer};
use asset_ref_index::adapters::outbound::filesystem::{JsonSnapshotRepository, ManifestAssetStore};
use asset_ref_index::adapters::outbound::memory::InMemoryAssetStore;
use asset_ref_index::application::dto::IndexOptions;
use asset_ref_index::application::index_service::ReferenceIndex;
use asset_ref_index::config::{
    discover_config, load_config_from_path, ConfigFile, DEFAULT_SNAPSHOT_PATH,
};
use asset_ref_index::ports::outbound::AssetStore;
use asset_ref_index::reference_index::domain::AssetId;
use asset_ref_index::shared::error::{ExitCode, IndexError};
use asset_ref_index::shared::logging::init_logging;
use asset_ref_index::shared::Result;
use clap::Parser;
use cli::{Args, Command};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

type CliIndex = ReferenceIndex<dyn AssetStore, JsonSnapshotRepository, StderrProgressReporter>;

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::InvalidArguments
            } else {
                ExitCode::Success
            };
            let _ = e.print();
            process::exit(code.as_i32());
        }
    };

    match run(args).await {
        Ok(code) => process::exit(code.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            for cause in e.chain().skip(1) {
                eprintln!("\nCaused by: {}", cause);
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let project_dir = project_dir(&args.manifest);
    let config = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => discover_config(&project_dir)?.unwrap_or_default(),
    };

    let log_level = args.log_level.as_deref().or(config.log_level.as_deref());
    init_logging(log_level)?;

    let options = config.apply_to(IndexOptions::default());
    let snapshot_path = snapshot_path(&args, &config, &project_dir);
    let assets = open_asset_store(&args)?;
    let index: CliIndex = ReferenceIndex::open(
        assets,
        JsonSnapshotRepository::new(snapshot_path),
        Arc::new(StderrProgressReporter::new()),
        options,
    );
    let renderer = TextRenderer::new(std::io::stdout().is_terminal());

    let code = execute(&index, &renderer, &args.command).await?;
    if !args.command.works_offline() {
        index.close().await;
    }
    Ok(code)
}

async fn execute(index: &CliIndex, renderer: &TextRenderer, command: &Command) -> Result<ExitCode> {
    match command {
        Command::Rebuild => {
            let summary = index.rebuild().await?;
            println!("{}", renderer.summary(&summary));
        }
        Command::Clear => {
            index.clear().await?;
            let location = index
                .snapshot_path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            eprintln!("🗑️  Index cleared: {}", location);
        }
        Command::Show { id } => {
            let id = AssetId::new(id.as_str())?;
            let view = index
                .asset_references(&id)
                .await?
                .ok_or_else(|| IndexError::UnknownAsset { id: id.to_string() })?;
            print!("{}", renderer.references(&view));
        }
        Command::Unused => {
            let unused = index.unused_assets().await?;
            eprintln!("{} asset(s) are not included in any build", unused.len());
            print!("{}", renderer.unused(&unused));
        }
        Command::Verify => {
            let violations = index.verify().await;
            if !violations.is_empty() {
                eprintln!(
                    "❌ Index is inconsistent: {} violation(s) found",
                    violations.len()
                );
                print!("{}", renderer.violations(&violations));
                return Ok(ExitCode::VerificationFailed);
            }
            println!("✅ Index is consistent");
        }
        Command::Stats => {
            print!("{}", renderer.stats(&index.stats().await));
        }
    }
    Ok(ExitCode::Success)
}

fn project_dir(manifest: &Path) -> PathBuf {
    match manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// CLI flag, then config file (relative to the project), then the default
fn snapshot_path(args: &Args, config: &ConfigFile, project_dir: &Path) -> PathBuf {
    if let Some(path) = &args.snapshot {
        return path.clone();
    }
    match &config.snapshot_path {
        Some(path) => project_dir.join(path),
        None => project_dir.join(DEFAULT_SNAPSHOT_PATH),
    }
}

fn open_asset_store(args: &Args) -> Result<Arc<dyn AssetStore>> {
    if args.command.works_offline() && !args.manifest.exists() {
        return Ok(Arc::new(InMemoryAssetStore::new()));
    }
    let store = ManifestAssetStore::from_path(&args.manifest)
        .with_context(|| format!("Failed to open asset manifest {}", args.manifest.display()))?;
    Ok(Arc::new(store))
}
