//! Error types and HTTP response mapping.
//!
//! Defines `BlameError` for every way blaming a single file can fail and
//! implements Axum's `IntoResponse` so handlers can bubble errors up with `?`.
//!
//! Error mappings:
//! - `PathNotFound`, `Untracked` → 404
//! - `InvalidPath` → 400
//! - `TimedOut` → 504
//! - everything else → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlameError {
    #[error("Unable to launch the jazz annotate command [{command}]: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("The jazz annotate command [{command}] timed out{hint}")]
    TimedOut { command: String, hint: &'static str },

    #[error("The jazz annotate command [{command}] failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Unable to blame file {file}. Unrecognized blame info at line {line}: {raw}")]
    UnrecognizedBlameInfo { file: String, line: u32, raw: String },

    #[error("Unable to blame file {file}. Expecting blame info for line {expected} but was {actual}: {raw}")]
    UnexpectedLine {
        file: String,
        expected: u32,
        actual: u32,
        raw: String,
    },

    #[error("File is not under version control: {0}")]
    Untracked(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for BlameError {
    fn into_response(self) -> Response {
        let status = match &self {
            BlameError::PathNotFound(_) | BlameError::Untracked(_) => StatusCode::NOT_FOUND,
            BlameError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            BlameError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
            BlameError::Spawn { .. }
            | BlameError::CommandFailed { .. }
            | BlameError::UnrecognizedBlameInfo { .. }
            | BlameError::UnexpectedLine { .. }
            | BlameError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, BlameError>;
