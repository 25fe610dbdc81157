//! Per-line blame for Jazz RTC sandboxes, read from `lscm annotate`.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod scm;

pub use config::BlameConfig;
pub use error::{BlameError, Result};
pub use models::{BlameLine, BlameResponse};
pub use scm::{BlameCommand, BlameInput, BlameOutput, BlameReport, FileOutcome, InputFile};
