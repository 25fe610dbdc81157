//! Blame data transfer objects.
//!
//! Provides per-line author attribution for a file as reported by
//! `lscm annotate`.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Response for a blame request on a single file.
#[derive(Debug, Serialize)]
pub struct BlameResponse {
    /// Path of the file, relative to the base directory
    pub path: String,
    /// Per-line blame information
    pub lines: Vec<BlameLine>,
}

/// Blame information for a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlameLine {
    /// Line number (1-indexed)
    pub line_number: u32,
    /// Name of the author who last modified this line
    pub author: String,
    /// Change set that last modified this line
    pub revision: String,
    /// When the change set was created, if the annotate output could be read
    pub date: Option<DateTime<FixedOffset>>,
}

impl BlameLine {
    /// Same attribution as `self`, placed on another line.
    pub fn at_line(&self, line_number: u32) -> Self {
        Self {
            line_number,
            ..self.clone()
        }
    }
}
