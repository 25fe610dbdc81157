//! Data transfer objects (DTOs) for CLI and API responses.
//!
//! - `blame`: BlameResponse, BlameLine for per-line author attribution

pub mod blame;

pub use blame::*;
