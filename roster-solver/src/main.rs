use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use roster_solver::{SolverLimits, demo_data, solve_month};
use shared::types::{ScheduleRequest, ScheduleResponse};

/// Monthly roster solver: reads a schedule request, solves the month,
/// and prints the staffing summary.
#[derive(Debug, Parser)]
#[command(name = "roster-solver", version)]
struct Cli {
    /// Path to a schedule request JSON file.
    #[arg(required_unless_present = "demo")]
    request: Option<PathBuf>,

    /// Write the full response JSON to this path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Solve a generated demo month instead of reading a request file.
    #[arg(long)]
    demo: bool,

    /// Seed for the demo request generator.
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    shared::telemetry::init_telemetry();

    let cli = Cli::parse();

    let request: ScheduleRequest = if cli.demo {
        demo_data::demo_request(cli.seed)
    } else {
        // required_unless_present guarantees the path is set here.
        let path = cli.request.context("missing request file")?;
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?
    };

    let limits = SolverLimits::from_env();
    let response = solve_month(&request, &limits)?;

    print_summary(&response);

    if let Some(path) = cli.output {
        let json = serde_json::to_string_pretty(&response)?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote response");
    }

    Ok(())
}

fn print_summary(response: &ScheduleResponse) {
    println!("Status: {}", response.status.as_str());
    println!("Solve time: {:.2}s", response.solve_time_seconds);
    println!("Objective: {:.0}", response.objective_value);

    if !response.understaffed.is_empty() {
        println!("\n=== Understaffed days ===");
        for shortfall in &response.understaffed {
            println!(
                "Day {}: needed {} but only {} available, deficit {}",
                shortfall.day, shortfall.needed, shortfall.available, shortfall.deficit
            );
        }
    }

    if response.employees.is_empty() {
        println!("\nNo schedule produced.");
        return;
    }

    println!(
        "\n{:<10} | {:>7} | {:>8} | {:>7} | {:>7} | {:>7} | {:>5} | {:>6} | {:>6}",
        "Name", "Worked", "Paid off", "Total", "Target", "Diff", "Opens", "Closes", "Middle"
    );
    println!("{}", "-".repeat(90));
    for stats in &response.employees {
        println!(
            "{:<10} | {:>7.1} | {:>8.1} | {:>7.1} | {:>7.1} | {:>+7.1} | {:>5} | {:>6} | {:>6}",
            stats.name,
            stats.worked,
            stats.paid_off,
            stats.total,
            stats.target,
            stats.diff,
            stats.opens,
            stats.closes,
            stats.middle
        );
    }
}
