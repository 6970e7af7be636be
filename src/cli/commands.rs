//! CLI command implementations.

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{serve as serve_api, AppState};
use crate::learning::LearnedPatternStore;
use crate::registry::{PlainCipher, RegistryReader};
use crate::reranker::{HttpAnalyzer, RelationshipAnalyzer};
use crate::suggest::SuggestionEngine;
use crate::types::config::Config;
use crate::SuggestResult;

/// Initializes configuration and empty databases in the target directory.
pub async fn init(path: Option<PathBuf>) -> SuggestResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("sambahayan.toml");
    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    let data_dir = target_dir.join(".sambahayan");
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!(".sambahayan/ directory created");
    }

    let config = Config::default();
    config.save(&config_path)?;

    // Create both databases with their schemas so serve starts clean.
    let reader = RegistryReader::open(
        target_dir.join(&config.storage.registry_db),
        Arc::new(PlainCipher),
    )?;
    reader.create_schema()?;
    LearnedPatternStore::open(
        target_dir.join(&config.storage.learning_db),
        config.matching.significance_floor,
    )?;

    println!("Sambahayan initialized.");
    println!("Configuration created at: {}", config_path.display());
    println!("Data directory: .sambahayan/");

    Ok(())
}

/// Starts the HTTP API server.
pub async fn serve(port: Option<u16>, config: &Config) -> SuggestResult<()> {
    let engine = build_engine(config)?;
    let state = AppState {
        engine: Arc::new(engine),
    };

    let port = port.unwrap_or(config.general.port);
    serve_api(state, port).await
}

/// Prints learning statistics.
pub async fn stats(config: &Config) -> SuggestResult<()> {
    let store = LearnedPatternStore::open(
        &config.storage.learning_db,
        config.matching.significance_floor,
    )?;
    let stats = store.statistics()?;

    println!("Families recorded:  {}", stats.total_families);
    println!("Members saved:      {}", stats.total_members);
    println!("Suggestions shown:  {}", stats.total_shown);
    println!("Accepted:           {}", stats.total_accepted);
    println!("Overall accuracy:   {:.1}%", stats.overall_accuracy * 100.0);
    println!("Trusted patterns:   {}", stats.derived_rule_count);

    if !stats.top_match_types.is_empty() {
        println!("\nTop match types:");
        for entry in &stats.top_match_types {
            println!(
                "  {:<28} shown {:>5}  accuracy {:.1}%",
                entry.match_type,
                entry.times_shown,
                entry.accuracy * 100.0
            );
        }
    }

    Ok(())
}

/// Prints the version.
pub fn version() {
    println!("sambahayan {}", env!("CARGO_PKG_VERSION"));
}

fn build_engine(config: &Config) -> SuggestResult<SuggestionEngine> {
    let reader = RegistryReader::open(&config.storage.registry_db, Arc::new(PlainCipher))?;
    let store = LearnedPatternStore::open(
        &config.storage.learning_db,
        config.matching.significance_floor,
    )?;

    let analyzer: Option<Arc<dyn RelationshipAnalyzer>> = HttpAnalyzer::from_config(&config.reranker)
        .map(|a| Arc::new(a) as Arc<dyn RelationshipAnalyzer>);

    if analyzer.is_some() {
        tracing::info!(endpoint = %config.reranker.endpoint, "external reranker enabled");
    }

    Ok(SuggestionEngine::new(
        reader,
        store,
        analyzer,
        config.matching.clone(),
    ))
}
