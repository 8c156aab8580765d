use axum::extract::State;
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::error::ApiError;
use crate::session;
use crate::upstream::{Relay, UpstreamError};
use crate::AppState;

/// Relay the caller's sources from the Pelios API.
///
/// Only the presence of the session cookie is checked here; the upstream
/// decides whether the token is still good.
///
/// GET /api/projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Relay, ApiError> {
    if !state.upstream.is_configured() {
        return Err(UpstreamError::MissingConfiguration.into());
    }

    let token = session::token(&jar).ok_or_else(|| ApiError::unauthorized("not authenticated"))?;

    let relay = state.upstream.fetch_sources(&token).await?;
    tracing::debug!(status = %relay.status, "Relaying sources");

    Ok(relay)
}
