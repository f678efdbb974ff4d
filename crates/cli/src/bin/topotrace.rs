//! Topotrace CLI
//!
//! Inspect and replay simulator traces, run scripts on a remote simulator,
//! and produce synthetic packet records for a trace's topology.
//!
//! # Example
//!
//! ```bash
//! # Summarize a trace
//! topotrace inspect out.nam
//!
//! # Replay the first ten seconds in 20ms steps
//! topotrace replay out.nam --until 10 --step 0.02
//!
//! # Generate 500 packets offline with a fixed seed
//! topotrace generate --trace out.nam --scenario "ddos attack" --count 500 --seed 7
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use topotrace_cli::{import_topology, run_replay, CliError, ReplayPlan, TraceSummary};
use topotrace_client::{
    spawn_generation, spawn_simulation, ClientConfig, PacketGeneratorClient, Scenario,
    SimulatorClient, TopologyPacketGenerator, TopologySnapshot,
};
use topotrace_editor::CommandLog;
use topotrace_graph::GraphStore;
use topotrace_replay::{PacerConfig, ReplayEngine};
use topotrace_trace::{parse_file, parse_str};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "topotrace")]
#[command(about = "Inspect, replay and generate network simulation traces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print counts, time span and bounds of a trace
    Inspect {
        /// Trace file
        trace: PathBuf,
    },

    /// Replay a trace headlessly and report active packets
    Replay {
        /// Trace file
        trace: PathBuf,

        /// Stop at this trace time (seconds)
        #[arg(long)]
        until: Option<f64>,

        /// Trace seconds per tick
        #[arg(long, default_value = "0.05")]
        step: f64,

        /// Seek here before playing
        #[arg(long)]
        seek: Option<f64>,

        /// Print a status line every N ticks
        #[arg(long, default_value = "20")]
        report_every: usize,

        /// Nominal tick interval in milliseconds
        #[arg(long, default_value = "40")]
        tick_ms: u64,
    },

    /// Run a script on the remote simulator and summarize the returned trace
    Simulate {
        /// Simulator endpoint URL
        #[arg(short, long)]
        endpoint: String,

        /// Script to upload
        #[arg(short, long)]
        script: PathBuf,

        /// Per-attempt timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Write the returned trace here
        #[arg(long)]
        trace_out: Option<PathBuf>,

        /// Write the returned animation artifact here
        #[arg(long)]
        artifact_out: Option<PathBuf>,
    },

    /// Produce packet records for a trace's topology as JSON
    Generate {
        /// Generator endpoint URL. Generates locally when omitted.
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Trace whose nodes and links form the topology
        #[arg(short, long)]
        trace: PathBuf,

        /// Traffic scenario, e.g. "normal traffic" or "ddos attack"
        #[arg(long, default_value = "normal traffic")]
        scenario: String,

        /// Number of packets
        #[arg(short, long, default_value = "100")]
        count: usize,

        /// Seed for local generation. When omitted, a random seed is used.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,topotrace=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { trace } => {
            let parsed = parse_file(&trace)?;
            println!("{}", TraceSummary::of(&parsed));
        }

        Commands::Replay {
            trace,
            until,
            step,
            seek,
            report_every,
            tick_ms,
        } => {
            let parsed = Arc::new(parse_file(&trace)?);
            let mut engine = ReplayEngine::with_trace(parsed);
            let plan = ReplayPlan {
                step,
                until,
                seek,
                report_every,
                pacer: PacerConfig::default().with_nominal_interval(Duration::from_millis(tick_ms)),
            };
            let report = run_replay(&mut engine, &plan)?;
            for line in &report.lines {
                println!("{}", line);
            }
            println!(
                "{} ticks, cursor {:.3}s, peak {} active, paced wall time {:?}",
                report.ticks, report.final_cursor, report.peak_active, report.paced_wall_time
            );
        }

        Commands::Simulate {
            endpoint,
            script,
            timeout,
            trace_out,
            artifact_out,
        } => {
            let config = ClientConfig::new(endpoint).with_timeout(Duration::from_secs(timeout));
            let client = SimulatorClient::new(config)?;
            let bytes = std::fs::read(&script)?;
            let name = script
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "script.tcl".to_string());

            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            let result = spawn_simulation(client, name, bytes, cancel)
                .wait()
                .await
                .ok_or_else(|| {
                    CliError::Simulation("simulation task ended without a result".to_string())
                })?;

            if !result.success {
                let message = result
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string());
                return Err(CliError::Simulation(message));
            }
            if let (Some(path), Some(artifact)) = (&artifact_out, &result.animation_artifact) {
                std::fs::write(path, artifact)?;
                info!(path = %path.display(), bytes = artifact.len(), "Wrote animation artifact");
            }
            match result.trace_text {
                Some(text) => {
                    if let Some(path) = &trace_out {
                        std::fs::write(path, &text)?;
                    }
                    println!("{}", TraceSummary::of(&parse_str(&text)));
                }
                None => warn!("Simulation succeeded but returned no trace"),
            }
        }

        Commands::Generate {
            endpoint,
            trace,
            scenario,
            count,
            seed,
        } => {
            let parsed = parse_file(&trace)?;
            let mut store = GraphStore::new();
            let mut log = CommandLog::new();
            import_topology(&parsed, &mut store, &mut log)?;

            let topology = TopologySnapshot::capture(&store);
            let scenario = Scenario::from_label(&scenario);

            let packets = match endpoint {
                Some(endpoint) => {
                    let client = PacketGeneratorClient::new(ClientConfig::new(endpoint))?;
                    spawn_generation(client, topology, scenario, count, CancellationToken::new())
                        .wait()
                        .await
                        .ok_or_else(|| {
                            CliError::Simulation(
                                "generation task ended without a result".to_string(),
                            )
                        })??
                }
                None => {
                    let seed = seed.unwrap_or_else(rand::random);
                    info!(seed, "Generating packets locally");
                    TopologyPacketGenerator::new(seed).generate(&topology, &scenario, count)
                }
            };

            let stdout = std::io::stdout();
            serde_json::to_writer_pretty(stdout.lock(), &packets)?;
            println!();
        }
    }

    Ok(())
}
