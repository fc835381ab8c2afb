//! `helmsman init-model` / `helmsman stats` — Snapshot management.

use std::path::Path;

use helmsman_config::HelmsmanConfig;
use helmsman_core::strategy::StrategyKind;
use helmsman_policy::PreferenceModel;

/// Write a fresh model snapshot (seeded weights, no history) to `output`.
pub fn init(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = HelmsmanConfig::load(&HelmsmanConfig::default_path())?;
    let model = PreferenceModel::new(config.policy);
    std::fs::write(output, model.export_model()?)?;
    println!("Wrote fresh model snapshot to {}", output.display());
    Ok(())
}

/// Load a snapshot and print per-strategy statistics.
pub fn stats(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = HelmsmanConfig::load(&HelmsmanConfig::default_path())?;
    let model = PreferenceModel::new(config.policy);
    let blob = std::fs::read_to_string(path)?;
    model.import_model(&blob)?;

    println!("Model snapshot: {}", path.display());
    println!("  Iterations:  {}", model.iterations());
    println!("  Exploration: {:.4}", model.exploration_rate());
    println!();
    println!("  {:<14} {:>8} {:>12}", "Strategy", "Count", "Avg reward");

    let stats = model.strategy_stats();
    for kind in StrategyKind::ALL {
        let s = stats.get(&kind).copied().unwrap_or_default();
        println!("  {:<14} {:>8} {:>12.3}", kind.to_string(), s.count, s.avg_reward);
    }
    Ok(())
}
