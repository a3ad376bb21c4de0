use std::path::PathBuf;

use tracing::{error, info};

use crate::{
    error::CutError,
    extract::{ExtractOutcome, extract_segments},
    window::SegmentSpec,
};

/// Traces cut when no input file is named on the command line.
pub const DEFAULT_TRACES: &[&str] = &[
    "../trace/exchange2.out",
    "../trace/gcc.out",
    "../trace/leela.out",
    "../trace/wrf.out",
];

/// Ordered list of traces for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub traces: Vec<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            traces: DEFAULT_TRACES.iter().map(PathBuf::from).collect(),
        }
    }
}

impl BatchConfig {
    pub fn single(trace: impl Into<PathBuf>) -> Self {
        Self {
            traces: vec![trace.into()],
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files, in batch order.
    pub written: Vec<PathBuf>,
    /// Inputs too short to cut.
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, CutError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cuts every configured trace in turn. A failing trace is logged and the
/// batch moves on to the next one.
pub struct BatchDriver {
    config: BatchConfig,
    output_dir: PathBuf,
    spec: SegmentSpec,
}

impl BatchDriver {
    pub fn new(config: BatchConfig, output_dir: impl Into<PathBuf>, spec: SegmentSpec) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            spec,
        }
    }

    pub fn run(&self) -> BatchReport {
        let mut report = BatchReport::default();
        for trace in &self.config.traces {
            match extract_segments(trace, &self.output_dir, self.spec) {
                Ok(ExtractOutcome::Written(written)) => report.written.push(written.output),
                Ok(ExtractOutcome::Skipped(_)) => report.skipped.push(trace.clone()),
                Err(e) => {
                    error!("Failed to cut {}: {e}", trace.display());
                    report.failed.push((trace.clone(), e));
                }
            }
        }
        info!(
            "Batch done: {} written, {} skipped, {} failed",
            report.written.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }
}
