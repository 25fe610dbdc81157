//! Blame endpoint.
//!
//! GET /api/v1/blame?path=<path>
//!
//! Returns per-line attribution for a file in the sandbox:
//! - Line number, author, change set, date

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::models::BlameResponse;
use crate::scm::SharedWorkspace;

pub fn routes(workspace: SharedWorkspace) -> Router {
    Router::new()
        .route("/api/v1/blame", get(get_blame))
        .with_state(workspace)
}

#[derive(Debug, Deserialize)]
struct BlameQuery {
    path: String,
}

async fn get_blame(
    State(workspace): State<SharedWorkspace>,
    Query(query): Query<BlameQuery>,
) -> Result<Json<BlameResponse>> {
    let response = workspace.get_blame(&query.path).await?;
    Ok(Json(response))
}
