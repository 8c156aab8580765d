// Dashboard pages
// Askama templates rendered server-side; every page load re-fetches from the Pelios API

mod format;
mod templates;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::auth::exchange;
use crate::api::error::ApiError;
use crate::models::{Credentials, Source};
use crate::session::{self, SessionContext};
use crate::upstream::TokenExchange;
use crate::AppState;

pub use format::*;
pub use templates::*;

const LOGIN_PATH: &str = "/login";
const PROJECTS_PATH: &str = "/projects";

// Helper to render templates and handle errors
fn render_template<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Template rendering failed");
            ApiError::internal(format!("Template error: {}", e)).into_response()
        }
    }
}

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/", get(index))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", post(logout))
        // Guarded routes
        .route("/projects", get(projects_list))
        .route("/projects/:id", get(project_detail))
}

// Presence check only; a stale token is caught when the upstream answers 401
fn require_token(jar: &CookieJar) -> Result<String, Redirect> {
    session::token(jar).ok_or_else(|| Redirect::to(LOGIN_PATH))
}

/// Result of the single upstream fetch a page performs
enum Loaded {
    Sources(Vec<Source>),
    /// Upstream rejected the token
    Unauthorized,
    Failed(StatusCode, String),
}

async fn load_sources(state: &AppState, token: &str) -> Loaded {
    let relay = match state.upstream.fetch_sources(token).await {
        Ok(relay) => relay,
        Err(e) => {
            let err = ApiError::from(e);
            return Loaded::Failed(err.status(), err.message().to_string());
        }
    };

    if relay.status == StatusCode::UNAUTHORIZED {
        return Loaded::Unauthorized;
    }

    if !relay.is_success() {
        let text = relay.text();
        let message = if text.trim().is_empty() {
            relay.status.to_string()
        } else {
            text
        };
        return Loaded::Failed(relay.status, message);
    }

    match relay.json::<Vec<Source>>() {
        Ok(sources) => Loaded::Sources(sources),
        Err(e) => {
            let err = ApiError::from(e);
            Loaded::Failed(err.status(), err.message().to_string())
        }
    }
}

async fn index() -> Redirect {
    Redirect::to(PROJECTS_PATH)
}

// Login page
async fn login_page() -> Response {
    render_template(login_template(String::new(), String::new()))
}

fn login_template(error: String, user_name: String) -> LoginTemplate {
    LoginTemplate {
        error,
        user_name,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

// Login submit
async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Response {
    let (status, error) = match exchange(&state, &credentials).await {
        Ok(TokenExchange::Issued(session)) => {
            let jar = session::issue(jar, &session, &state.config.session);
            return (jar, Redirect::to(PROJECTS_PATH)).into_response();
        }
        Ok(TokenExchange::Rejected(relay)) => {
            let text = relay.text();
            let message = if text.trim().is_empty() {
                relay.status.to_string()
            } else {
                text
            };
            (relay.status, message)
        }
        Err(err) => (err.status(), err.message().to_string()),
    };

    let template = login_template(error, credentials.user_name);
    (status, render_template(template)).into_response()
}

// Logout always lands on the login page, whatever state the cookies were in
async fn logout(jar: CookieJar) -> impl IntoResponse {
    tracing::info!(had_token = session::token(&jar).is_some(), "Logout");
    (session::clear(jar), Redirect::to(LOGIN_PATH))
}

#[derive(Debug, Default, Deserialize)]
struct ProjectsQuery {
    q: Option<String>,
    status: Option<String>,
}

// Projects grid
async fn projects_list(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    jar: CookieJar,
    Query(query): Query<ProjectsQuery>,
) -> Response {
    let token = match require_token(&jar) {
        Ok(token) => token,
        Err(redirect) => return redirect.into_response(),
    };

    let search = query.q.unwrap_or_default();
    let status = StatusFilter::parse(query.status.as_deref());

    let (code, error, sources) = match load_sources(&state, &token).await {
        Loaded::Sources(sources) => (StatusCode::OK, String::new(), sources),
        Loaded::Unauthorized => return Redirect::to(LOGIN_PATH).into_response(),
        Loaded::Failed(code, message) => (code, message, Vec::new()),
    };

    let template = ProjectsTemplate {
        session,
        error,
        stats: DashboardStats::from_sources(&sources),
        projects: filter_sources(&sources, &search, status)
            .into_iter()
            .map(ProjectCard::from)
            .collect(),
        search,
        statuses: StatusOption::all(status),
    };

    (code, render_template(template)).into_response()
}

// Project detail
async fn project_detail(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let token = match require_token(&jar) {
        Ok(token) => token,
        Err(redirect) => return redirect.into_response(),
    };

    let not_found = || ApiError::not_found(format!("Project {} not found", id));

    let (code, error, project) = match load_sources(&state, &token).await {
        Loaded::Unauthorized => return Redirect::to(LOGIN_PATH).into_response(),
        Loaded::Failed(code, message) => (code, message, None),
        Loaded::Sources(sources) => {
            let found = id
                .parse::<i64>()
                .ok()
                .and_then(|id| sources.iter().find(|s| s.id == id));
            match found {
                Some(source) => (StatusCode::OK, String::new(), Some(ProjectDetail::from(source))),
                None => {
                    let err = not_found();
                    (err.status(), err.message().to_string(), None)
                }
            }
        }
    };

    let template = ProjectDetailTemplate {
        session,
        error,
        project,
    };

    (code, render_template(template)).into_response()
}
