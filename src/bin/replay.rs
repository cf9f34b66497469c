//! Demangle replay tool
//!
//! Replays a JSON-lines trace of intercepted filesystem events through a
//! demangler and prints the answer to every demangle query.

use anyhow::{Context, Result};
use clap::Parser;
use layeredfs_demangler::{read_trace, Demangler, DemanglerConfig, FsEvent, LaunchOptions};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[derive(Parser, Debug)]
#[command(name = "demangle-replay")]
#[command(about = "Replay recorded ramfs/imagefs mount events and resolve mangled paths")]
struct Args {
    /// JSON-lines event trace
    trace: PathBuf,

    /// TOML file overriding archive extension and mount type names
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print final table sizes as JSON
    #[arg(long)]
    stats: bool,

    /// Host launch flags, passed after `--`
    ///
    /// `--layered-verbose` raises the log level, `--layered-logfile=PATH`
    /// appends logs to PATH instead of stderr and `--layered-disable` turns
    /// the demangler off. The allow/block lists and `--layered-devmode` only
    /// affect the mod-override layer and are just echoed here.
    #[arg(last = true)]
    launch_flags: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let launch = LaunchOptions::from_args(&args.launch_flags);

    let level = if launch.verbose_logs {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let writer = match &launch.logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {:?}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::stderr),
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_ansi(launch.logfile.is_none())
        .with_writer(writer)
        .init();

    info!("{}", launch.describe());

    let config = match &args.config {
        Some(path) => DemanglerConfig::load(path)
            .with_context(|| format!("failed to load config {:?}", path))?,
        None => DemanglerConfig::default(),
    };
    let config = launch.apply_to(config);

    let file = File::open(&args.trace).with_context(|| format!("failed to open trace {:?}", args.trace))?;
    let events = read_trace(BufReader::new(file))
        .with_context(|| format!("failed to parse trace {:?}", args.trace))?;
    info!("Replaying {} events from {:?}", events.len(), args.trace);

    let mut demangler = Demangler::with_config(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for event in &events {
        if let Some(resolved) = demangler.apply(event) {
            if let FsEvent::Demangle { path } = event {
                writeln!(out, "{} -> {}", path, resolved)?;
            }
        }
    }

    if args.stats {
        writeln!(out, "{}", serde_json::to_string_pretty(&demangler.stats())?)?;
    }

    Ok(())
}
