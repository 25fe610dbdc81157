//! API route handlers - maps HTTP endpoints to annotate operations.
//!
//! - `blame`: Per-line author attribution (GET /api/v1/blame)

pub mod blame;

use axum::Router;

use crate::scm::SharedWorkspace;

pub fn create_router(workspace: SharedWorkspace) -> Router {
    Router::new().merge(blame::routes(workspace))
}
