//! SqueezeLab CLI: replay recorded market data through the signal engine.
//!
//! Commands:
//! - `replay` warm up from historical bars, replay a tick file, write signals as JSON lines
//! - `config` print the default strategy configuration as TOML

mod replay;

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use squeezelab_core::{SignalEngine, StrategyConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "squeezelab",
    about = "SqueezeLab CLI: squeeze/PSAR signal engine replay"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a tick CSV through the engine and emit signals as JSON lines.
    Replay {
        /// Path to a TOML strategy config. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Warmup bar CSV: instrument,timestamp,open,high,low,close,volume.
        #[arg(long)]
        warmup: Option<PathBuf>,

        /// Tick CSV: instrument,price,volume,timestamp.
        #[arg(long)]
        ticks: PathBuf,

        /// Write signals here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Process instruments one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Print the default configuration as TOML.
    Config {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            config,
            warmup,
            ticks,
            output,
            sequential,
        } => run_replay(config, warmup, ticks, output, !sequential),
        Commands::Config { output } => run_config(output),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<StrategyConfig> {
    match path {
        Some(path) => StrategyConfig::from_file(&path)
            .with_context(|| format!("load config {}", path.display())),
        None => Ok(StrategyConfig::default()),
    }
}

fn open_output(path: Option<PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(&path).with_context(|| format!("create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn run_replay(
    config: Option<PathBuf>,
    warmup: Option<PathBuf>,
    ticks: PathBuf,
    output: Option<PathBuf>,
    parallel: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let mut engine = SignalEngine::new(config).context("build signal engine")?;

    if let Some(path) = warmup {
        let file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
        let loaded = replay::read_warmup(file)?;
        for (instrument, records) in loaded.by_instrument {
            let report = engine
                .warmup(&instrument, records)
                .with_context(|| format!("warm up {instrument}"))?;
            if report.skipped > 0 {
                info!(%instrument, skipped = report.skipped, "warmup records skipped");
            }
        }
    }

    let file = File::open(&ticks).with_context(|| format!("open {}", ticks.display()))?;
    let loaded = replay::read_ticks(file)?;
    let known: HashMap<String, Vec<_>> = loaded
        .by_instrument
        .into_iter()
        .filter(|(instrument, _)| engine.instrument(instrument).is_some())
        .collect();
    if known.is_empty() {
        bail!(
            "no ticks for configured symbols {:?} in {}",
            engine.config().symbols,
            ticks.display()
        );
    }

    let outcomes = replay::replay_all(engine.into_instruments(), &known, parallel);

    let mut out = open_output(output)?;
    let signals = replay::merge_signals(&outcomes);
    for signal in &signals {
        serde_json::to_writer(&mut out, signal)?;
        writeln!(out)?;
    }
    out.flush()?;

    for outcome in &outcomes {
        let status = &outcome.status;
        info!(
            instrument = %status.instrument,
            ticks = status.ticks_processed,
            rejected = outcome.rejected,
            signals = outcome.signals.len(),
            position_open = status.position_open,
            halted = status.halted,
            "replay finished"
        );
    }
    info!(
        signals = signals.len(),
        unreadable_rows = loaded.unreadable,
        "replay complete"
    );
    Ok(())
}

fn run_config(output: Option<PathBuf>) -> Result<()> {
    let text = StrategyConfig::default()
        .to_toml_string()
        .context("serialize default config")?;
    let mut out = open_output(output)?;
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}
