mod cli;
mod utils;

use booth_catalog::config::{load_config, AppConfig, MatchConfig, StorageBackend};
use booth_catalog::fetcher::{OgImageFetcher, ThumbnailFetcher};
use booth_catalog::matcher::{FilenameMatcher, Matcher};
use booth_catalog::model::{CatalogError, MatchCandidate, MatchResult, MatchTier};
use booth_catalog::normalizer::base_key;
use booth_catalog::parser::{import_documents, PurchaseHistoryParser};
use booth_catalog::storage::{JsonDocumentStorage, MappingPersistence, SqliteStorage};
use booth_catalog::store::MappingStore;
use clap::Parser;
use cli::{Cli, Command};
use futures::future::join_all;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use utils::file_name_of;

type Store = MappingStore<Box<dyn MappingPersistence>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open mapping store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Command::Import { files } => run_import(&mut store, &files),
        Command::Match { files, apply, json } => {
            run_match(&mut store, &config, &files, apply, json).await
        }
        Command::Learn { file, url } => store
            .learn(base_key(&file_name_of(&file)), &url)
            .map(|outcome| info!("Learn result: {:?}", outcome))
            .map_err(Into::into),
        Command::Forget { key } => match store.forget(&key) {
            Ok(true) => {
                info!("Removed mapping '{}'", key);
                Ok(())
            }
            Ok(false) => {
                warn!("No mapping named '{}'", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        Command::Reset => store
            .reset()
            .map(|n| info!("Removed {} mappings", n))
            .map_err(Into::into),
        Command::List => {
            for entry in store.entries() {
                let learned_at = entry
                    .learned_at
                    .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
                println!("{}\t{}\t{}", entry.key, entry.url, learned_at);
            }
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Opens the mapping store on the backend chosen in the config.
fn open_store(config: &AppConfig) -> Result<Store, CatalogError> {
    let persistence: Box<dyn MappingPersistence> = match config.storage {
        StorageBackend::Json => Box::new(JsonDocumentStorage::new(&config.data_file)),
        StorageBackend::Sqlite => Box::new(SqliteStorage::new(&config.sqlite_path)?),
    };
    MappingStore::open(persistence)
}

fn run_import(store: &mut Store, files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        info!("Reading purchase history {}", path.display());
        documents.push(fs::read_to_string(path)?);
    }

    let parser = PurchaseHistoryParser::new();
    let report = import_documents(&parser, store, &documents)?;
    info!(
        "Imported {} files: {} items, {} unique, {} new mappings, {} already known",
        report.documents, report.total_items, report.unique_items, report.added, report.skipped
    );
    Ok(())
}

/// Matches every file, then fetches thumbnails and learns mappings for the
/// candidates that clear the auto-action threshold.
async fn run_match(
    store: &mut Store,
    config: &AppConfig,
    files: &[PathBuf],
    apply: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let matcher = FilenameMatcher::new(config.matching.clone());
    let results = match_files(&matcher, &*store, files)?;

    if json {
        let rows: Vec<_> = results
            .iter()
            .map(|(name, result)| serde_json::json!({ "file": name, "result": result }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (name, result) in &results {
            print_result(name, result, &config.matching);
        }
    }

    if !apply {
        return Ok(());
    }

    let accepted: Vec<(&str, &MatchCandidate)> = results
        .iter()
        .filter_map(|(name, result)| Some((name.as_str(), result.best()?)))
        .filter(|(_, candidate)| candidate.is_auto_actionable(&config.matching))
        .collect();
    info!("{} of {} matches are trusted enough to apply", accepted.len(), results.len());

    let fetcher = OgImageFetcher::new(Duration::from_secs(config.thumbnail_timeout_seconds))?;
    let tasks = accepted.iter().map(|(name, candidate)| {
        let fetcher = &fetcher;
        async move { (*name, fetcher.fetch_thumbnail(&candidate.url).await) }
    });
    for (name, thumbnail) in join_all(tasks).await {
        match thumbnail {
            Ok(url) => println!("{name}\tthumbnail\t{url}"),
            Err(e) => warn!("Thumbnail fetch failed for {}: {}", name, e),
        }
    }

    for (name, candidate) in accepted {
        if candidate.tier != MatchTier::Learned {
            store.learn(base_key(name), &candidate.url)?;
        }
    }
    Ok(())
}

/// Runs the matcher over every file name. Unusable names are logged and
/// skipped so one bad path does not abort the batch.
fn match_files<P: MappingPersistence>(
    matcher: &FilenameMatcher,
    store: &MappingStore<P>,
    files: &[PathBuf],
) -> Result<Vec<(String, MatchResult)>, CatalogError> {
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let name = file_name_of(path);
        match matcher.find(&name, store) {
            Ok(result) => results.push((name, result)),
            Err(CatalogError::InvalidInput(reason)) => {
                warn!("Skipping {}: {}", path.display(), reason);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(results)
}

fn print_result(name: &str, result: &MatchResult, cfg: &MatchConfig) {
    match result.best() {
        Some(candidate) if candidate.is_suggestion() => {
            let marker = if candidate.is_auto_actionable(cfg) { "trusted" } else { "suggestion" };
            println!(
                "{name}\t{:?}\t{:.2}\t{marker}\t{}",
                candidate.tier, candidate.score, candidate.url
            );
        }
        Some(candidate) => println!("{name}\tno match\tsearch: {}", candidate.url),
        None => println!("{name}\tno match"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_file_names_are_skipped() {
        let mut store = MappingStore::open(SqliteStorage::in_memory().unwrap()).unwrap();
        store
            .learn("avatar_clothes", "https://booth.pm/ja/items/1")
            .unwrap();
        let matcher = FilenameMatcher::new(MatchConfig::default());
        let files = [
            PathBuf::from("dir/.zip"),
            PathBuf::from("downloads/avatar_clothes.zip"),
        ];

        let results = match_files(&matcher, &store, &files).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "avatar_clothes.zip");
        assert_eq!(
            results[0].1.best().map(|c| c.tier),
            Some(MatchTier::Learned)
        );
    }
}
