//! End-to-end tests for the session boundary: token exchange, proxying,
//! guarded pages and logout, against a local stand-in for the Pelios API.

use axum::{
    body::Body,
    extract::Query,
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use pelios_dashboard::api::create_router;
use pelios_dashboard::config::Config;
use pelios_dashboard::AppState;

const SOURCES_JSON: &str = r#"[{"id":7,"url":"https://www.youtube.com/watch?v=abc123","timeFrom":3600,"timeTo":3686,"processed":true,"userId":"u-1","faces":[{"faceId":1,"sourceId":7,"faceIndex":0,"clips":[{"clipId":1,"timeFrom":3600,"timeTo":3610,"faceId":1,"speaker":true,"visible":true,"clipScore":0.9,"transcribed":"hello world","text":[]}],"scores":[{"scoreId":1,"faceId":1,"scoreType":"happy","score":0.8,"timeIndex":0}]}]},{"id":8,"url":"https://example.com/talk.mp4","timeFrom":0,"timeTo":30,"processed":false,"userId":"u-1","faces":[]}]"#;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenQuery {
    user_name: String,
    password: String,
}

async fn fake_token(Query(query): Query<TokenQuery>) -> Response {
    match (query.user_name.as_str(), query.password.as_str()) {
        ("ada", "secret") => Json(json!({ "token": "tok-ada" })).into_response(),
        ("garbled", _) => (StatusCode::OK, "<html>not json</html>").into_response(),
        ("tokenless", _) => Json(json!({ "message": "welcome" })).into_response(),
        _ => (StatusCode::UNAUTHORIZED, "Invalid username or password").into_response(),
    }
}

async fn fake_sources(headers: HeaderMap) -> Response {
    let no_store = headers
        .get(header::CACHE_CONTROL)
        .map(|v| v == "no-store")
        .unwrap_or(false);
    if !no_store {
        return (StatusCode::BAD_REQUEST, "caching was not disabled").into_response();
    }

    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bearer tok-ada") => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            SOURCES_JSON,
        )
            .into_response(),
        Some("Bearer broken") => {
            (StatusCode::INTERNAL_SERVER_ERROR, "database on fire").into_response()
        }
        Some("Bearer garbled") => (StatusCode::OK, "not json at all").into_response(),
        _ => (StatusCode::UNAUTHORIZED, "token expired").into_response(),
    }
}

/// Start the stand-in Pelios API and return its origin
async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/api/Auth/token", get(fake_token))
        .route("/api/Sources", get(fake_sources));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// An origin nothing is listening on
async fn dead_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn dashboard(base_url: Option<String>) -> Router {
    let mut config = Config::default();
    config.api.base_url = base_url;
    create_router(Arc::new(AppState::new(config).unwrap()))
}

fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_exchange_then_projects_relay() {
    let app = dashboard(Some(spawn_upstream().await));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/token",
            json!({ "userName": "ada", "password": "secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let token = cookies
        .iter()
        .find(|c| c.starts_with("pelios_token="))
        .expect("token cookie");
    assert!(token.contains("pelios_token=tok-ada"));
    assert!(token.contains("HttpOnly"));
    assert!(token.contains("SameSite=Lax"));
    let user = cookies
        .iter()
        .find(|c| c.starts_with("pelios_user="))
        .expect("user cookie");
    assert!(user.contains("Max-Age=2592000"));

    assert_eq!(body_json(response).await, json!({ "ok": true, "userName": "ada" }));

    let response = app
        .oneshot(get_with_cookie("/api/projects", Some("pelios_token=tok-ada")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    assert_eq!(body_text(response).await, SOURCES_JSON);
}

#[tokio::test]
async fn test_rejected_credentials_relay_upstream_text() {
    let app = dashboard(Some(spawn_upstream().await));

    let response = app
        .oneshot(post_json(
            "/api/auth/token",
            json!({ "userName": "ada", "password": "wrong" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_text(response).await, "Invalid username or password");
}

#[tokio::test]
async fn test_malformed_token_response_is_502() {
    let app = dashboard(Some(spawn_upstream().await));

    for user in ["garbled", "tokenless"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/token",
                json!({ "userName": user, "password": "x" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY, "user {}", user);
        assert!(set_cookies(&response).is_empty());
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "upstream_decode_error");
    }
}

#[tokio::test]
async fn test_blank_credentials_are_rejected_locally() {
    // No upstream at all: validation must fail before any request is made
    let app = dashboard(Some(dead_upstream().await));

    let response = app
        .oneshot(post_json(
            "/api/auth/token",
            json!({ "userName": "", "password": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(body["error"]["details"]["userName"].is_array());
}

#[tokio::test]
async fn test_unreadable_token_body_uses_error_envelope() {
    let app = dashboard(Some(dead_upstream().await));

    let broken_json = Request::builder()
        .method("POST")
        .uri("/api/auth/token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(broken_json).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"].as_str().unwrap().contains("JSON"));

    let plain_text = Request::builder()
        .method("POST")
        .uri("/api/auth/token")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("userName=ada&password=secret"))
        .unwrap();
    let response = app.oneshot(plain_text).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Content-Type"));
}

#[tokio::test]
async fn test_projects_without_cookie_is_401() {
    let app = dashboard(Some(spawn_upstream().await));

    let response = app
        .oneshot(get_with_cookie("/api/projects", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "unauthorized");
    assert_eq!(body["error"]["message"], "not authenticated");
}

#[tokio::test]
async fn test_projects_relays_upstream_errors() {
    let app = dashboard(Some(spawn_upstream().await));

    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/projects", Some("pelios_token=broken")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "database on fire");

    let response = app
        .oneshot(get_with_cookie("/api/projects", Some("pelios_token=stale")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "token expired");
}

#[tokio::test]
async fn test_unreachable_upstream_is_structured_502() {
    let base = dead_upstream().await;
    let app = dashboard(Some(base.clone()));

    let response = app
        .oneshot(get_with_cookie("/api/projects", Some("pelios_token=tok-ada")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "upstream_unreachable");
    assert_eq!(
        body["error"]["details"]["endpoint"],
        format!("{}/api/Sources", base)
    );
}

#[tokio::test]
async fn test_missing_base_url_is_500() {
    let app = dashboard(None);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/projects", Some("pelios_token=tok-ada")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"]["code"], "missing_configuration");

    let response = app
        .oneshot(post_json(
            "/api/auth/token",
            json!({ "userName": "ada", "password": "secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"]["code"], "missing_configuration");
}

#[tokio::test]
async fn test_logout_clears_cookies_without_upstream() {
    let app = dashboard(None);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, "pelios_token=tok-ada; pelios_user=ada")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    assert_eq!(body_json(response).await, json!({ "ok": true }));

    // The page variant always lands on the login screen
    let response = app.oneshot(post_form("/logout", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert_eq!(set_cookies(&response).len(), 2);
}

#[tokio::test]
async fn test_guarded_pages_redirect_without_cookie() {
    let app = dashboard(Some(spawn_upstream().await));

    for uri in ["/projects", "/projects/7"] {
        let response = app
            .clone()
            .oneshot(get_with_cookie(uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/login");
    }
}

#[tokio::test]
async fn test_stale_token_redirects_to_login() {
    let app = dashboard(Some(spawn_upstream().await));

    let response = app
        .oneshot(get_with_cookie("/projects", Some("pelios_token=stale")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_projects_page_renders_grid_and_filters() {
    let app = dashboard(Some(spawn_upstream().await));
    let cookie = Some("pelios_token=tok-ada; pelios_user=ada");

    let response = app
        .clone()
        .oneshot(get_with_cookie("/projects", cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Project #7"));
    assert!(html.contains("Project #8"));
    assert!(html.contains("hqdefault.jpg"));
    assert!(html.contains("ada"));

    let response = app
        .oneshot(get_with_cookie("/projects?status=pending&q=talk", cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Project #8"));
    assert!(!html.contains("Project #7"));
}

#[tokio::test]
async fn test_projects_page_shows_raw_upstream_error() {
    let app = dashboard(Some(spawn_upstream().await));

    let response = app
        .clone()
        .oneshot(get_with_cookie("/projects", Some("pelios_token=broken")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("database on fire"));

    let response = app
        .oneshot(get_with_cookie("/projects", Some("pelios_token=garbled")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("malformed response"));
}

#[tokio::test]
async fn test_project_detail_page() {
    let app = dashboard(Some(spawn_upstream().await));
    let cookie = Some("pelios_token=tok-ada");

    let response = app
        .clone()
        .oneshot(get_with_cookie("/projects/7", cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Project #7"));
    assert!(html.contains("hello world"));
    assert!(html.contains("badge-green"));
    assert!(html.contains("1:26"));

    for uri in ["/projects/99", "/projects/not-a-number"] {
        let response = app
            .clone()
            .oneshot(get_with_cookie(uri, cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert!(body_text(response).await.contains("not found"));
    }
}

#[tokio::test]
async fn test_login_form_flow() {
    let app = dashboard(Some(spawn_upstream().await));

    let response = app
        .clone()
        .oneshot(get_with_cookie("/login", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_form("/login", "userName=ada&password=secret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/projects");
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("pelios_token=tok-ada")));

    let response = app
        .oneshot(post_form("/login", "userName=ada&password=nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert!(body_text(response)
        .await
        .contains("Invalid username or password"));
}

#[tokio::test]
async fn test_root_and_health() {
    let app = dashboard(None);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/", None))
        .await
        .unwrap();
    assert_eq!(location(&response), "/projects");

    let response = app
        .oneshot(get_with_cookie("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}
