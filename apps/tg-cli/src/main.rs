use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tg_app::{
    AppResult, RunOptions, SweepConfig, list_scenarios, load_scenarios, run_scenario, run_sweep,
};
use tg_results::ResultsStore;

#[derive(Parser)]
#[command(name = "tg-cli")]
#[command(about = "Triggerflow CLI - event-triggered buck converter studies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario file syntax and structure
    Validate {
        /// Path to the scenario file (JSON or YAML)
        scenario_path: PathBuf,
    },
    /// List scenarios in a file
    Scenarios {
        /// Path to the scenario file
        scenario_path: PathBuf,
    },
    /// Run the simulation batch for every non-ignored scenario
    Run {
        /// Path to the scenario file
        scenario_path: PathBuf,
        /// Results output directory
        #[arg(short, long, default_value = "results")]
        out: PathBuf,
        /// Design weight rho for the trigger solve
        #[arg(long, default_value_t = 0.5)]
        rho: f64,
        /// Reporting step in seconds
        #[arg(long, default_value_t = 1e-5)]
        step: f64,
        /// Run only the named scenario entry
        #[arg(long)]
        scenario: Option<String>,
    },
    /// Sweep the design weight rho and collect trade-off metrics
    Sweep {
        /// Path to the scenario file
        scenario_path: PathBuf,
        /// Results output directory
        #[arg(short, long, default_value = "results")]
        out: PathBuf,
        /// First rho value
        #[arg(long, default_value_t = 0.1)]
        rho_start: f64,
        /// Grid step
        #[arg(long, default_value_t = 0.1)]
        rho_step: f64,
        /// Last rho value (values >= 1 are excluded)
        #[arg(long, default_value_t = 1.0)]
        rho_end: f64,
        /// Sweep only the named scenario entry
        #[arg(long)]
        scenario: Option<String>,
    },
    /// Show stored results for a scenario tag
    Show {
        /// Results output directory
        out: PathBuf,
        /// Scenario tag
        tag: String,
    },
    /// Export one stored series as CSV
    ExportSeries {
        /// Results output directory
        out: PathBuf,
        /// Scenario tag
        tag: String,
        /// Series name (e.g. static_etm_linearized)
        series: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Scenarios { scenario_path } => cmd_scenarios(&scenario_path),
        Commands::Run {
            scenario_path,
            out,
            rho,
            step,
            scenario,
        } => cmd_run(&scenario_path, &out, rho, step, scenario.as_deref()),
        Commands::Sweep {
            scenario_path,
            out,
            rho_start,
            rho_step,
            rho_end,
            scenario,
        } => cmd_sweep(
            &scenario_path,
            &out,
            rho_start,
            rho_step,
            rho_end,
            scenario.as_deref(),
        ),
        Commands::Show { out, tag } => cmd_show(&out, &tag),
        Commands::ExportSeries {
            out,
            tag,
            series,
            output,
        } => cmd_export_series(&out, &tag, &series, output.as_deref()),
    }
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario file: {}", scenario_path.display());
    let scenarios = load_scenarios(scenario_path)?;
    println!("✓ Scenario file is valid ({} entries)", scenarios.len());
    Ok(())
}

fn cmd_scenarios(scenario_path: &Path) -> AppResult<()> {
    let scenarios = load_scenarios(scenario_path)?;
    println!("Scenarios in file:");
    for summary in list_scenarios(&scenarios) {
        let marker = if summary.ignored { " (ignored)" } else { "" };
        println!(
            "  {} - tag '{}', end time {:.4} s{}",
            summary.name, summary.tag, summary.end_time, marker
        );
    }
    Ok(())
}

fn cmd_run(
    scenario_path: &Path,
    out: &Path,
    rho: f64,
    step: f64,
    only: Option<&str>,
) -> AppResult<()> {
    let scenarios = load_scenarios(scenario_path)?;
    let store = ResultsStore::new(out.to_path_buf())?;
    let options = RunOptions {
        rho,
        step,
        ..RunOptions::default()
    };

    let mut completed = 0usize;
    for (name, def) in &scenarios {
        if only.is_some_and(|wanted| wanted != name) {
            continue;
        }
        if def.ignore && only.is_none() {
            println!("- {name}: skipped (ignore flag)");
            continue;
        }
        println!("Running scenario '{name}' (tag '{}')", def.tag);
        match run_scenario(name, def, &store, &options) {
            Ok(outcome) => {
                println!(
                    "✓ {name}: {} series saved under {}",
                    outcome.series.len(),
                    store.root().join(&outcome.tag).display()
                );
                completed += 1;
            }
            Err(error) => {
                eprintln!("✗ {name}: {error}");
            }
        }
    }
    println!("Done: {completed} scenario(s) completed");
    Ok(())
}

fn cmd_sweep(
    scenario_path: &Path,
    out: &Path,
    rho_start: f64,
    rho_step: f64,
    rho_end: f64,
    only: Option<&str>,
) -> AppResult<()> {
    let scenarios = load_scenarios(scenario_path)?;
    let store = ResultsStore::new(out.to_path_buf())?;
    let config = SweepConfig {
        rho_start,
        rho_step,
        rho_end,
        ..SweepConfig::default()
    };

    for (name, def) in &scenarios {
        if only.is_some_and(|wanted| wanted != name) {
            continue;
        }
        if def.ignore && only.is_none() {
            println!("- {name}: skipped (ignore flag)");
            continue;
        }
        println!(
            "Sweeping rho over [{rho_start}, {rho_end}] (step {rho_step}) for scenario '{name}'"
        );
        match run_sweep(name, def, &store, &config) {
            Ok(points) => {
                println!("✓ {name}: {} sweep point(s) collected", points.len());
                for point in points {
                    let settle = point
                        .settling_time
                        .map(|v| format!("{v:.6}"))
                        .unwrap_or_else(|| "-".to_string());
                    let mean = point
                        .mean_inter_event_time
                        .map(|v| format!("{v:.3e}"))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  rho = {:.3}: settling {} s, mean IET {} s",
                        point.rho, settle, mean
                    );
                }
            }
            Err(error) => {
                eprintln!("✗ {name}: {error}");
            }
        }
    }
    Ok(())
}

fn cmd_show(out: &Path, tag: &str) -> AppResult<()> {
    let store = ResultsStore::new(out.to_path_buf())?;
    let manifest = store.load_manifest(tag)?;

    println!("Scenario results: {tag}");
    println!("  Run ID: {}", manifest.run_id);
    println!("  Scenario entry: {}", manifest.scenario);
    println!("  Timestamp: {}", manifest.timestamp);
    println!("  Solver version: {}", manifest.solver_version);
    println!("\nSeries:");
    for name in &manifest.series {
        println!("  {name}");
    }
    Ok(())
}

fn cmd_export_series(
    out: &Path,
    tag: &str,
    series: &str,
    output: Option<&Path>,
) -> AppResult<()> {
    let store = ResultsStore::new(out.to_path_buf())?;
    let (header, columns) = store.read_series(tag, series)?;

    let mut csv = String::new();
    csv.push_str(&header.join(","));
    csv.push('\n');
    let rows = columns.first().map_or(0, Vec::len);
    for row in 0..rows {
        let cells: Vec<String> = columns.iter().map(|c| c[row].to_string()).collect();
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Exported {rows} data points to {}", path.display());
    } else {
        print!("{csv}");
    }

    Ok(())
}
