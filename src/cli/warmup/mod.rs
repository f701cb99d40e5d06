//! Warmup command - pre-computes embeddings for popular queries

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::services::CacheWarmupService;

#[derive(Debug, Args)]
pub struct WarmupArgs {
    /// JSON file of the form `{ "queries": [...] }`
    #[arg(long, default_value = "data/popular-queries.json")]
    pub queries: PathBuf,

    /// Snapshot destination; defaults to `cache.snapshot_path`
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Pause between provider calls, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,
}

pub async fn run(args: WarmupArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let provider = crate::create_embedding_provider(&config.embedding)?;
    let output = args
        .output
        .unwrap_or_else(|| config.cache.snapshot_path.clone());

    let service =
        CacheWarmupService::new(provider).with_delay(Duration::from_millis(args.delay_ms));
    let report = service.run(&args.queries, &output).await?;

    info!(
        generated = report.generated,
        failed = report.failed,
        skipped = report.skipped,
        output = %report.output.display(),
        "Cache warmup complete"
    );

    Ok(())
}
