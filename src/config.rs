//! Command-line configuration.

use std::{ffi::OsString, path::PathBuf};

use clap::{Parser, error::ErrorKind};

use crate::{batch::BatchConfig, error::Result, window::SegmentSpec};

pub const DEFAULT_SEGMENT_SIZE: u64 = 1_000_000;
pub const DEFAULT_OUTPUT_DIR: &str = "trace";

#[derive(Parser, Debug)]
#[command(
    name = "trace-cut",
    version,
    about = "Cut the beginning, middle and end segments out of line-oriented traces"
)]
struct Cli {
    /// Lines per segment
    #[arg(
        default_value_t = DEFAULT_SEGMENT_SIZE,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    segment_size: u64,
    /// Trace to cut; the built-in trace list is used when omitted
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
    /// Directory receiving the cut traces
    #[arg(value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ConfigError(#[from] clap::Error);

impl ConfigError {
    /// `--help` or `--version` rather than a real error.
    pub fn is_informational(&self) -> bool {
        matches!(
            self.0.kind(),
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub segment_size: u64,
    pub input: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
            input: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Config {
    /// Parses `args`, program name first.
    pub fn parse_from<I, T>(args: I) -> std::result::Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        Ok(Self {
            segment_size: cli.segment_size,
            input: cli.input,
            output_dir: cli.output_dir,
        })
    }

    pub fn segment_spec(&self) -> Result<SegmentSpec> {
        SegmentSpec::new(self.segment_size)
    }

    /// The named input alone, or `defaults` when none was given.
    pub fn batch(&self, defaults: BatchConfig) -> BatchConfig {
        match &self.input {
            Some(input) => BatchConfig::single(input.clone()),
            None => defaults,
        }
    }
}
