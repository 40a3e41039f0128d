use anyhow::Result;
use chanharvest::{init_tracing_once, CollectionEngine, HarvestOptions, YouTubeCatalog};
use std::path::PathBuf;

/// Usage: `chanharvest [config.json]`; `HARVEST_*` environment variables override the file.
fn main() -> Result<()> {
    init_tracing_once();

    let opts = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => HarvestOptions::from_json_file(&path)?,
        None => HarvestOptions::default(),
    }
    .merge_env()?;
    opts.validate()?;

    let client = YouTubeCatalog::new(opts.api_base.clone())?;
    let output = opts.output.clone();
    let mut engine = CollectionEngine::new(opts, client)?;
    let summary = engine.run()?;

    println!("Finished! Collected {} channels ({} new this run).", summary.total, summary.accepted);
    println!("Data saved to {}", output.display());
    Ok(())
}
