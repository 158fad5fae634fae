use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use flagfall::logging::init_logging;
use flagfall::runtime;
use flagfall::{ClockConfig, Rounding, TimeControl};

/// Terminal chess clock. Reads commands on stdin, writes clock events on stdout.
#[derive(Parser, Debug)]
#[command(name = "flagfall", version, about)]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Time control as W+I or W/B+I, in clock units
    #[arg(long)]
    control: Option<TimeControl>,

    /// Length of one clock unit in milliseconds
    #[arg(long)]
    unit_ms: Option<u64>,

    /// Elapsed-time rounding: nearest or carry
    #[arg(long)]
    rounding: Option<Rounding>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Result<ClockConfig> {
        let mut config = match &self.config {
            Some(path) => ClockConfig::from_file(path)?,
            None => ClockConfig::default(),
        };
        if let Some(control) = self.control {
            config.control = control;
        }
        if let Some(unit_ms) = self.unit_ms {
            config.unit_ms = unit_ms;
        }
        if let Some(rounding) = self.rounding {
            config.rounding = rounding;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.into_config()?;
    tracing::info!(version = flagfall::VERSION, control = %config.control, unit_ms = config.unit_ms, "flagfall ready");

    let commands = runtime::spawn_stdin_reader();
    runtime::run(commands, tokio::io::stdout(), &config).await
}
