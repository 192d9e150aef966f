//! RoadCare scenario CLI
//!
//! Run the duplicate-detection scenarios, or check a single request file.

use clap::Parser;
use roadcare_core::{DetectionConfig, Priority};
use roadcare_sim::scenarios::ScenarioId;
use roadcare_sim::{CheckRequest, ScenarioExport, ScenarioResult, ScenarioRunner};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// RoadCare duplicate-detection scenario CLI
#[derive(Parser, Debug)]
#[command(name = "roadcare-sim")]
#[command(about = "Run deterministic duplicate-detection scenarios for RoadCare", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (repeat_submitter, cooled_down, cross_user, hotspot,
    /// malformed_feed, scan_cap, invalid_location, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Write every scenario result to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Check one request file ({newReport, userReports, allReports, options}) instead
    #[arg(long)]
    check: Option<String>,

    /// Base priority the calculated priority escalates from
    #[arg(long, default_value = "Low")]
    base_priority: String,
}

/// `--check`: evaluate one request and print the response.
fn run_check(path: &str, base: Priority) -> i32 {
    let request = match CheckRequest::from_file(path) {
        Ok(request) => request,
        Err(e) => {
            error!("Failed to read request {}: {}", path, e);
            return 1;
        }
    };

    let response = request.evaluate(base);
    match serde_json::to_string_pretty(&response) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            error!("Failed to encode response: {}", e);
            1
        }
    }
}

fn print_json_summary(results: &[ScenarioResult], failed_count: usize) {
    let summary = serde_json::json!({
        "total": results.len(),
        "passed": results.len() - failed_count,
        "failed": failed_count,
        "results": results.iter().map(|r| {
            serde_json::json!({
                "scenario": r.scenario.name(),
                "seed": r.seed,
                "passed": r.passed,
                "can_submit": r.metrics.can_submit,
                "similar_reports": r.metrics.similar_reports,
                "failure_reason": r.failure_reason,
            })
        }).collect::<Vec<_>>(),
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to encode summary: {}", e),
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let base_priority = Priority::from_label(&args.base_priority);

    if let Some(path) = &args.check {
        std::process::exit(run_check(path, base_priority));
    }

    if !args.json {
        info!("RoadCare Scenario Harness v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                eprintln!("Error: {}", e);
                let names: Vec<_> = ScenarioId::all().iter().map(|s| s.name()).collect();
                eprintln!("Available scenarios: {}, all", names.join(", "));
                std::process::exit(1);
            }
        }
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let config = DetectionConfig::default();
    let mut export = ScenarioExport::new(base_seed, config.clone());

    // Run scenarios
    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);

        let runner = ScenarioRunner::new(seed)
            .with_config(config.clone())
            .with_base_priority(base_priority);

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            export.add_result(result);
        }
    }

    if let Some(path) = &args.export {
        match export.write_to_file(path) {
            Ok(()) => info!("Exported {} results to {}", export.results.len(), path),
            Err(e) => error!("Failed to write export: {}", e),
        }
    }

    // Summary
    let total = export.results.len();
    let failed_count = export.failed;

    if args.json {
        print_json_summary(&export.results, failed_count);
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);

            for result in export.results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
