//! Rank every withdrawal strategy of every scenario
//!
//! Usage: cargo run --bin compare_strategies -- --scenarios data/scenarios.csv

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;

use retirement_projection::plan::{load_scenarios, load_strategies};
use retirement_projection::{Assumptions, ScenarioAnalyzer, StrategyComparison};

#[derive(Parser, Debug)]
#[command(name = "compare_strategies", about = "Compare withdrawal strategies side by side")]
struct Args {
    #[arg(long, default_value = "data/scenarios.csv")]
    scenarios: PathBuf,

    #[arg(long, default_value = "data/strategies.csv")]
    strategies: PathBuf,

    /// Directory holding rmd_divisors.csv
    #[arg(long)]
    assumptions: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let assumptions = match &args.assumptions {
        Some(dir) => Assumptions::from_csv_path(dir)
            .with_context(|| format!("loading assumptions from {}", dir.display()))?,
        None => Assumptions::default_tables(),
    };
    let analyzer = ScenarioAnalyzer::with_assumptions(assumptions);

    let scenarios = load_scenarios(&args.scenarios)
        .with_context(|| format!("loading scenarios from {}", args.scenarios.display()))?;
    let strategies = load_strategies(&args.strategies)
        .with_context(|| format!("loading strategies from {}", args.strategies.display()))?;

    let start = Instant::now();
    for scenario in &scenarios {
        let candidates: Vec<_> = strategies
            .iter()
            .filter(|s| s.scenario_id == scenario.scenario_id)
            .cloned()
            .collect();
        if candidates.is_empty() {
            continue;
        }

        let mut comparisons = analyzer.compare_strategies(scenario, &candidates);
        comparisons.sort_by(|a, b| rank_key(b).cmp(&rank_key(a)));

        println!("Scenario: {} ({} strategies)", scenario.name, comparisons.len());
        println!(
            "  {:<32} {:>12} {:>16} {:>16}",
            "Strategy", "Outcome", "Withdrawn", "Final Balance"
        );
        println!("  {}", "-".repeat(79));

        for comparison in &comparisons {
            match &comparison.outcome {
                Ok(outlook) => {
                    let summary = outlook.result.summary();
                    let outcome = match summary.depletion_year {
                        Some(year) => format!("depleted y{}", year),
                        None => "sustainable".to_string(),
                    };
                    println!(
                        "  {:<32} {:>12} {:>16.2} {:>16.2}",
                        comparison.strategy_name,
                        outcome,
                        summary.total_withdrawn,
                        summary.final_balance
                    );
                }
                Err(e) => println!("  {:<32} error: {}", comparison.strategy_name, e),
            }
        }
        println!();
    }

    log::info!(
        "Compared {} strategies across {} scenarios in {:?}",
        strategies.len(),
        scenarios.len(),
        start.elapsed()
    );
    Ok(())
}

/// Sustainable first, then longest-lasting, then most withdrawn; errors last
fn rank_key(comparison: &StrategyComparison) -> (bool, usize, Decimal) {
    match &comparison.outcome {
        Ok(outlook) => (
            outlook.sustainable,
            outlook.result.rows.len(),
            outlook.result.total_withdrawn(),
        ),
        Err(_) => (false, 0, Decimal::MIN),
    }
}
