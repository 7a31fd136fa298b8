//! Epiview binary
//!
//! Subscribes to one simulation on the producer and replays its grid in the
//! terminal or as SVG frames. Playback is driven by commands on stdin:
//! `start`, `pause`, `resume`, `stop`, `status`, `quit`.

use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use epiconf::EpiviewConfig;
use epiproto::SimulationId;
use epiview::{
    Pipeline, PipelineOptions, PipelineReport, RenderSink, SessionStatus, SvgSink, TerminalSink,
    UserCommand, ZmqChannel,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// Coloured text grid on stdout
    Terminal,
    /// One SVG file per frame
    Svg,
}

/// Live viewer for epidemic simulation grids
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Simulation to subscribe to
    simulation_id: String,

    /// Producer endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Config file to use instead of ./epiview.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Milliseconds between frames (overrides config)
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Where frames are drawn
    #[arg(long, value_enum, default_value = "terminal")]
    sink: SinkKind,

    /// Output directory for the svg sink
    #[arg(long, default_value = "epiview-frames")]
    out: PathBuf,

    /// Start playing without waiting for `start`
    #[arg(long)]
    autoplay: bool,

    /// Exit once every received frame has been shown
    #[arg(long)]
    exit_on_complete: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = EpiviewConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(endpoint) = &cli.endpoint {
        config.infra.producer.endpoint = endpoint.clone();
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.playback.tick_ms = tick_ms;
    }

    if cli.show_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    init_tracing(&config.infra.telemetry.log_level)?;
    info!("epiview {} starting", env!("CARGO_PKG_VERSION"));
    for path in &sources.files {
        info!("config file: {}", path.display());
    }
    for var in &sources.env_overrides {
        info!("config override from ${}", var);
    }

    let simulation = SimulationId::new(cli.simulation_id.trim());
    let identity = format!(
        "{}-{}-{}",
        config.infra.producer.identity_prefix,
        simulation,
        std::process::id()
    );
    let channel = ZmqChannel::connect(&config.infra.producer.endpoint, identity.as_bytes())
        .with_context(|| format!("Failed to connect to {}", config.infra.producer.endpoint))?;

    let sink: Box<dyn RenderSink> = match cli.sink {
        SinkKind::Terminal => Box::new(TerminalSink::new(io::stdout())),
        SinkKind::Svg => Box::new(
            SvgSink::create(&cli.out)
                .with_context(|| format!("Failed to create {}", cli.out.display()))?,
        ),
    };

    let options = PipelineOptions {
        autoplay: cli.autoplay,
        exit_on_complete: cli.exit_on_complete,
    };
    let mut pipeline = Pipeline::open(channel, simulation, &config.playback, sink, options)
        .await
        .context("Failed to subscribe")?;

    // Not a runtime task: runtime shutdown would wait on the blocking read.
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("epiview-stdin".into())
        .spawn(move || read_commands(tx))
        .context("Failed to start stdin reader")?;

    if !options.autoplay {
        info!("type `start` to begin playback");
    }

    let report = pipeline.run(rx).await?;
    finish(&report);
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .with_context(|| format!("Invalid log level '{}'", log_level))?;

    // stdout belongs to the terminal sink
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

/// Forward stdin lines as commands until EOF or the pipeline goes away.
fn read_commands(tx: mpsc::Sender<UserCommand>) {
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("stdin read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<UserCommand>() {
            Ok(command) => {
                if tx.blocking_send(command).is_err() {
                    break;
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
}

fn finish(report: &PipelineReport) {
    match report.session {
        SessionStatus::Failed => error!("{}", report),
        _ if report.is_complete() => info!("{}", report),
        _ => warn!("{}", report),
    }
}
