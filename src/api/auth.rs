use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::error::ApiError;
use super::validation::validate_credentials;
use crate::models::{Credentials, LoginResponse, OkResponse};
use crate::session;
use crate::upstream::TokenExchange;
use crate::AppState;

/// Validate credentials and run them past the Pelios API.
///
/// Shared by the JSON endpoint and the HTML login form.
pub(crate) async fn exchange(
    state: &AppState,
    credentials: &Credentials,
) -> Result<TokenExchange, ApiError> {
    validate_credentials(credentials)?;
    Ok(state.upstream.exchange_token(credentials).await?)
}

/// Token exchange endpoint
///
/// POST /api/auth/token
pub async fn token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(credentials) = payload?;
    match exchange(&state, &credentials).await? {
        TokenExchange::Issued(session) => {
            let jar = session::issue(jar, &session, &state.config.session);
            let body = LoginResponse {
                ok: true,
                user_name: session.user_name,
            };
            Ok((jar, Json(body)).into_response())
        }
        TokenExchange::Rejected(relay) => Ok(relay.into_response()),
    }
}

/// Logout endpoint. Always succeeds.
///
/// POST /api/auth/logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    tracing::info!(had_token = session::token(&jar).is_some(), "Logout");
    (session::clear(jar), Json(OkResponse::ok()))
}
