use std::{io::IsTerminal, process::ExitCode};

use anyhow::Result;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use trace_cut::{BatchConfig, BatchDriver, Config};

fn main() -> ExitCode {
    init_tracing();

    let config = match Config::parse_from(std::env::args_os()) {
        Ok(config) => config,
        Err(e) => {
            print!("{e}");
            return if e.is_informational() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    match run(&config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every trace was cut or skipped without error.
fn run(config: &Config) -> Result<bool> {
    let spec = config.segment_spec()?;
    let batch = config.batch(BatchConfig::default());
    let driver = BatchDriver::new(batch, &config.output_dir, spec);
    Ok(driver.run().is_success())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
