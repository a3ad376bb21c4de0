//! Cut fixed-size beginning, middle and end segments out of large
//! line-oriented trace files without holding them in memory.

pub mod batch;
pub mod config;
pub mod count;
pub mod error;
pub mod extract;
pub mod window;

pub use batch::{BatchConfig, BatchDriver, BatchReport};
pub use config::{Config, ConfigError};
pub use count::count_lines;
pub use error::{CutError, Result};
pub use extract::{ExtractOutcome, ExtractReport, extract_segments};
pub use window::{SegmentSpec, Window, WindowPlan};
