//! Retirement Projection CLI
//!
//! Projects each scenario to retirement and prints the drawdown ledger for
//! every withdrawal strategy attached to it.

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal_macros::dec;
use serde::Serialize;

use retirement_projection::plan::{load_scenarios, load_strategies};
use retirement_projection::projection::write_ledger_csv;
use retirement_projection::{
    Assumptions, RetirementOutlook, RmdTable, ScenarioAnalyzer, ScenarioSummary, StrategyType,
    WithdrawalStrategy,
};

#[derive(Parser, Debug)]
#[command(
    name = "retirement_projection",
    about = "Project retirement savings and simulate withdrawal strategies"
)]
struct Args {
    /// Scenario CSV export
    #[arg(long, default_value = "data/scenarios.csv")]
    scenarios: PathBuf,

    /// Withdrawal strategy CSV export, linked to scenarios by ScenarioID
    #[arg(long, default_value = "data/strategies.csv")]
    strategies: PathBuf,

    /// Directory holding rmd_divisors.csv; built-in table when omitted
    #[arg(long)]
    assumptions: Option<PathBuf>,

    /// Directory to write one ledger CSV per strategy
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print results as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ScenarioReport<'a> {
    summary: ScenarioSummary,
    strategies: Vec<StrategyReport<'a>>,
}

#[derive(Serialize)]
struct StrategyReport<'a> {
    strategy: &'a WithdrawalStrategy,
    outlook: RetirementOutlook,
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
    log::info!(
        "Loaded {} scenarios and {} strategies",
        scenarios.len(),
        strategies.len()
    );

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    let mut reports = Vec::new();
    for scenario in &scenarios {
        let summary = analyzer
            .summarize(scenario)
            .with_context(|| format!("summarizing scenario '{}'", scenario.name))?;

        let mut strategy_reports = Vec::new();
        for strategy in strategies
            .iter()
            .filter(|s| s.scenario_id == scenario.scenario_id)
        {
            let outlook = analyzer
                .simulate_retirement(scenario, strategy)
                .with_context(|| {
                    format!(
                        "simulating '{}' for scenario '{}'",
                        strategy.name, scenario.name
                    )
                })?;

            if let Some(dir) = &args.output {
                let path = dir.join(format!("ledger_{}.csv", strategy.strategy_id));
                let file = File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                write_ledger_csv(file, &outlook.result.rows)?;
                log::info!("Ledger for '{}' written to {}", strategy.name, path.display());
            }

            strategy_reports.push(StrategyReport { strategy, outlook });
        }

        if strategy_reports.is_empty() {
            log::warn!("Scenario '{}' has no withdrawal strategies", scenario.name);
        }

        reports.push(ScenarioReport {
            summary,
            strategies: strategy_reports,
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report, &analyzer.assumptions().rmd);
        }
    }

    Ok(())
}

fn print_report(report: &ScenarioReport, rmd: &RmdTable) {
    let summary = &report.summary;
    println!("Scenario: {}", summary.name);
    println!("  Years to retirement:      {}", summary.years_to_retirement);
    println!("  Years in retirement:      {}", summary.years_in_retirement);
    println!("  Projected savings:        ${:.2}", summary.projected_savings);
    println!("  Annual withdrawal needed: ${:.2}", summary.annual_withdrawal_needed);
    println!();

    for entry in &report.strategies {
        let result = &entry.outlook.result;
        println!(
            "  Strategy: {} ({})",
            entry.strategy.name,
            entry.strategy.strategy_type.as_str()
        );
        // RMD ledgers also show the distribution rate for the attained age
        let show_rate = matches!(
            entry.strategy.strategy_type,
            StrategyType::RequiredMinimumDistribution { .. }
        );

        print!(
            "  {:>4} {:>4} {:>16} {:>14} {:>14} {:>16}",
            "Year", "Age", "Start Balance", "Withdrawal", "Growth", "End Balance"
        );
        if show_rate {
            print!(" {:>8}", "RMD %");
        }
        println!();
        println!("  {}", "-".repeat(if show_rate { 82 } else { 73 }));

        for row in result.rows.iter().map(|r| r.rounded()) {
            print!(
                "  {:>4} {:>4} {:>16.2} {:>14.2} {:>14.2} {:>16.2}",
                row.year_index,
                row.age,
                row.starting_balance,
                row.withdrawal,
                row.growth,
                row.balance_after_growth,
            );
            if show_rate {
                print!(" {:>8.2}", rmd.rate(row.age) * dec!(100));
            }
            println!();
        }

        let totals = result.summary();
        println!();
        println!("  Total withdrawn: ${:.2}", totals.total_withdrawn);
        println!("  Final balance:   ${:.2}", totals.final_balance);
        match (result.depletion_year(), result.depletion_age()) {
            (Some(year), Some(age)) => {
                println!("  Depleted in year {} (age {})", year, age)
            }
            _ => println!("  Sustainable to life expectancy"),
        }
        println!();
    }
}
