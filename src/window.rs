//! Window arithmetic for the begin/middle/end cut.
//!
//! A plan only exists for traces of at least four segment widths. Under that
//! gate `middle.start >= 1.5 * size` and `end.start - middle.end >= size / 2`,
//! so both skip distances are non-negative and the windows never overlap.

use crate::error::{CutError, Result};

/// Number of segment widths a trace must hold before it is cut.
pub const FEASIBILITY_FACTOR: u64 = 4;

/// Requested segment size, always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSpec {
    segment_size: u64,
}

impl SegmentSpec {
    pub fn new(segment_size: u64) -> Result<Self> {
        if segment_size == 0 {
            return Err(CutError::ZeroSegmentSize);
        }
        Ok(Self { segment_size })
    }

    pub fn segment_size(&self) -> u64 {
        self.segment_size
    }

    /// Smallest line count that passes the feasibility gate, `None` if it
    /// does not fit in a `u64`.
    pub fn min_total_lines(&self) -> Option<u64> {
        self.segment_size.checked_mul(FEASIBILITY_FACTOR)
    }
}

/// Half-open range of line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: u64,
    pub end: u64,
}

impl Window {
    fn at(start: u64, len: u64) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Trace too short for the requested segment size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Infeasible {
    pub total_lines: u64,
    /// `None` when four segment widths overflow a `u64`.
    pub required: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    pub total_lines: u64,
    pub begin: Window,
    pub middle: Window,
    pub end: Window,
}

impl WindowPlan {
    pub fn new(total_lines: u64, spec: SegmentSpec) -> std::result::Result<Self, Infeasible> {
        let size = spec.segment_size();
        let infeasible = Infeasible {
            total_lines,
            required: spec.min_total_lines(),
        };
        match spec.min_total_lines() {
            Some(required) if total_lines >= required => {}
            _ => return Err(infeasible),
        }

        let begin = Window::at(0, size);
        let middle = Window::at(total_lines / 2 - size / 2, size);
        let end = Window::at(total_lines - size, size);

        // Holds for every input past the gate; checked so a plan can never
        // describe overlapping windows.
        if begin.end > middle.start || middle.end > end.start {
            return Err(infeasible);
        }
        Ok(Self {
            total_lines,
            begin,
            middle,
            end,
        })
    }

    pub fn segment_size(&self) -> u64 {
        self.begin.len()
    }

    /// Lines discarded between the begin and middle windows.
    pub fn skip_to_middle(&self) -> u64 {
        self.middle.start - self.begin.end
    }

    /// Lines discarded between the middle and end windows.
    pub fn skip_to_end(&self) -> u64 {
        self.end.start - self.middle.end
    }

    pub fn windows(&self) -> [Window; 3] {
        [self.begin, self.middle, self.end]
    }

    /// Lines the cut will contain.
    pub fn output_lines(&self) -> u64 {
        self.windows().iter().map(Window::len).sum()
    }
}
