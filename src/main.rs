use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use photo_renamer::config::Config;
use photo_renamer::credentials::KeychainStore;
use photo_renamer::describer::GeminiDescriber;
use photo_renamer::notifier::LogNotifier;
use photo_renamer::orchestrator::Orchestrator;
use photo_renamer::photo::{PhotoItem, PhotoState};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "photo-renamer")]
#[command(about = "Rename photos after their AI-generated descriptions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Describe photos and suggest a file name for each
    Analyze {
        /// Image files to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Rename every photo that received a suggestion
        #[arg(long)]
        rename: bool,
    },
    /// Store the Gemini API key in the system keychain
    SetKey { key: String },
    /// Remove the stored Gemini API key
    DeleteKey,
}

#[tokio::main]
async fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting photo-renamer");

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Analyze { paths, rename } => analyze(paths, rename).await,
        Command::SetKey { key } => KeychainStore::new()?.save(key.trim()),
        Command::DeleteKey => KeychainStore::new()?.delete(),
    }
}

async fn analyze(paths: Vec<PathBuf>, rename: bool) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let describer = Arc::new(GeminiDescriber::new(
        config.ai.clone(),
        config.rename.fallback_stem.clone(),
    )?);

    // A missing key is reported per photo, not here
    match KeychainStore::new().and_then(|store| store.load()) {
        Ok(key) => describer.set_api_key(key),
        Err(e) => warn!("Could not read API key: {:#}", e),
    }

    let mut orchestrator = Orchestrator::new(describer, Box::new(LogNotifier), &config);
    orchestrator.add_items(resolve_inputs(paths));

    if orchestrator.is_empty() {
        anyhow::bail!("None of the given paths is a readable file");
    }

    info!("Analyzing {} photo(s)...", orchestrator.len());
    orchestrator.settle().await;

    if rename {
        let summary = orchestrator.rename_all();
        println!(
            "Renamed {} photo(s), {} failed, {} skipped\n",
            summary.renamed, summary.failed, summary.skipped
        );
    }

    for item in orchestrator.items() {
        print_item(item);
    }

    Ok(())
}

/// Canonicalizes user input, dropping anything that is not an existing file.
fn resolve_inputs(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter_map(|path| match path.canonicalize() {
            Ok(absolute) if absolute.is_file() => Some(absolute),
            Ok(_) => {
                warn!("Path is not a file, skipping: {:?}", path);
                None
            }
            Err(e) => {
                warn!("Cannot access {:?}, skipping: {}", path, e);
                None
            }
        })
        .collect()
}

fn print_item(item: &PhotoItem) {
    println!("{} [{:?}]", item.original_name(), item.state());
    if let Some(description) = item.description() {
        println!("  description: {}", description);
    }
    if let Some(name) = item.suggested_name() {
        println!("  suggestion:  {}", name);
    }
    if item.state() == PhotoState::Renamed {
        println!("  renamed to:  {}", item.source_path().display());
    }
    if let Some(err) = item.last_error() {
        println!("  error:       {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_inputs_keeps_only_files() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let photo = temp_dir.path().join("IMG_0001.jpg");
        fs::write(&photo, b"x")?;
        let folder = temp_dir.path().join("album");
        fs::create_dir(&folder)?;
        let missing = temp_dir.path().join("missing.jpg");

        let resolved = resolve_inputs(vec![folder, photo.clone(), missing]);

        assert_eq!(resolved, vec![photo.canonicalize()?]);
        Ok(())
    }

    #[test]
    fn test_resolve_inputs_canonicalizes_relative_segments() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir(temp_dir.path().join("album"))?;
        let photo = temp_dir.path().join("beach.png");
        fs::write(&photo, b"x")?;

        let resolved = resolve_inputs(vec![temp_dir.path().join("album/../beach.png")]);

        assert_eq!(resolved, vec![photo.canonicalize()?]);
        assert!(resolved[0].is_absolute());
        Ok(())
    }
}
