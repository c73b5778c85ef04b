use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fleet_core::metrics::SimulationSummary;
use fleet_core::telemetry::{RequestSnapshot, SimulationReport};
use fleet_core::{DispatchEngine, ScenarioParams, TripPhases};
use rayon::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fleet",
    about = "Discrete-time ride-hailing dispatch simulation",
    long_about = "Runs the fleet dispatch simulation over a rectangular city and prints\n\
                  the event log, final fleet state, or summary metrics."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print its report
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Include summary metrics in JSON output
        #[arg(long)]
        summary: bool,
        /// Include every ride request and its final status in JSON output
        #[arg(long)]
        requests: bool,
        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run many seeds in parallel and print one summary per run
    Sweep {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Number of runs; run i uses seed + i
        #[arg(long, default_value_t = 8)]
        runs: u64,
        /// Worker threads (defaults to one per core)
        #[arg(long)]
        threads: Option<usize>,
        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Report as pretty-printed JSON
    Json,
    /// Event log, one line per event
    Text,
}

#[derive(Clone, Copy, ValueEnum)]
enum PhasesArg {
    Combined,
    Split,
}

impl From<PhasesArg> for TripPhases {
    fn from(arg: PhasesArg) -> Self {
        match arg {
            PhasesArg::Combined => TripPhases::Combined,
            PhasesArg::Split => TripPhases::Split,
        }
    }
}

/// Scenario overrides. Flags win over the params file, which wins over defaults.
#[derive(Args)]
struct ScenarioArgs {
    /// JSON file with `ScenarioParams`; missing fields take default values
    #[arg(long, env = "FLEET_PARAMS")]
    params: Option<PathBuf>,
    #[arg(long, env = "FLEET_SEED")]
    seed: Option<u64>,
    #[arg(long)]
    vehicles: Option<usize>,
    #[arg(long)]
    steps: Option<usize>,
    /// Seconds per tick
    #[arg(long)]
    time_step: Option<f64>,
    /// Chance of one new request per tick
    #[arg(long)]
    demand_probability: Option<f64>,
    #[arg(long)]
    base_speed_kmh: Option<f64>,
    #[arg(long, value_enum)]
    trip_phases: Option<PhasesArg>,
}

impl ScenarioArgs {
    fn resolve(&self) -> Result<ScenarioParams> {
        let mut params = match &self.params {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading params file {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing params file {}", path.display()))?
            }
            None => ScenarioParams::default(),
        };
        if let Some(seed) = self.seed {
            params = params.with_seed(seed);
        }
        if let Some(vehicles) = self.vehicles {
            params = params.with_num_vehicles(vehicles);
        }
        if let Some(steps) = self.steps {
            params = params.with_steps(steps);
        }
        if let Some(time_step) = self.time_step {
            params = params.with_time_step_secs(time_step);
        }
        if let Some(p) = self.demand_probability {
            params = params.with_demand_probability(p);
        }
        if let Some(speed) = self.base_speed_kmh {
            params = params.with_base_speed_kmh(speed);
        }
        if let Some(phases) = self.trip_phases {
            params = params.with_trip_phases(phases.into());
        }
        params.validate().context("invalid scenario parameters")?;
        Ok(params)
    }
}

#[derive(Serialize)]
struct RunOutput {
    #[serde(flatten)]
    report: SimulationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SimulationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requests: Option<Vec<RequestSnapshot>>,
}

impl RunOutput {
    fn new(
        engine: &DispatchEngine,
        params: &ScenarioParams,
        summary: bool,
        requests: bool,
    ) -> Self {
        Self {
            report: engine.report(),
            summary: summary.then(|| engine.summary().with_seed(params.seed)),
            requests: requests.then(|| engine.request_snapshots()),
        }
    }
}

fn run_scenario(params: &ScenarioParams) -> DispatchEngine {
    let mut engine = DispatchEngine::new(params.clone());
    engine.run(params.steps, params.time_step_secs, params.demand_probability);
    engine
}

fn write_output(output: Option<&PathBuf>, body: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, body)
            .with_context(|| format!("writing output to {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            stdout.write_all(b"\n")?;
            Ok(())
        }
    }
}

fn run(
    scenario: &ScenarioArgs,
    format: OutputFormat,
    summary: bool,
    requests: bool,
    output: Option<&PathBuf>,
) -> Result<()> {
    let params = scenario.resolve()?;
    tracing::info!(
        vehicles = params.num_vehicles,
        steps = params.steps,
        seed = ?params.seed,
        "starting simulation"
    );
    let engine = run_scenario(&params);

    let body = match format {
        OutputFormat::Text => engine.log().lines().collect::<Vec<_>>().join("\n"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&RunOutput::new(&engine, &params, summary, requests))?
        }
    };
    write_output(output, &body)
}

fn sweep(
    scenario: &ScenarioArgs,
    runs: u64,
    threads: Option<usize>,
    output: Option<&PathBuf>,
) -> Result<()> {
    let base = scenario.resolve()?;
    let first_seed = base.seed.unwrap_or(0);
    let param_sets: Vec<ScenarioParams> = (0..runs)
        .map(|i| base.clone().with_seed(first_seed.wrapping_add(i)))
        .collect();

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().context("building thread pool")?;
    tracing::info!(runs, threads = pool.current_num_threads(), "starting sweep");

    let summaries: Vec<SimulationSummary> = pool.install(|| {
        param_sets
            .par_iter()
            .map(|params| run_scenario(params).summary().with_seed(params.seed))
            .collect()
    });

    write_output(output, &serde_json::to_string_pretty(&summaries)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Run {
            scenario,
            format,
            summary,
            requests,
            output,
        } => run(scenario, *format, *summary, *requests, output.as_ref()),
        Commands::Sweep {
            scenario,
            runs,
            threads,
            output,
        } => sweep(scenario, *runs, *threads, output.as_ref()),
    }
}
