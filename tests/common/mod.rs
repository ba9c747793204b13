use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use servicemart::config::{CliArgs, ServerConfig};
use servicemart::http;
use servicemart::state::AppState;
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "admin123";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

/// Fresh server with an ephemeral store and a bootstrapped `admin` account.
pub fn app() -> TestApp {
    let config = ServerConfig::from_args(CliArgs {
        ephemeral: true,
        admin_password: Some(ADMIN_PASSWORD.into()),
        ..CliArgs::default()
    })
    .expect("test config");
    let state = Arc::new(AppState::new(config).expect("test state"));
    TestApp {
        router: http::router(state.clone()),
        state,
    }
}

/// Send one request through the router; returns status, headers, and the
/// parsed JSON body (Null for empty or non-JSON bodies).
pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));
    let json = if bytes.is_empty() || !is_json {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, headers, json)
}

/// Log in as the bootstrap admin and return the `admin_token=...` cookie pair.
pub async fn login(app: &TestApp) -> String {
    let (status, headers, _) = send(
        app,
        "POST",
        "/api/admin/login",
        None,
        Some(serde_json::json!({
            "username": "admin",
            "password": ADMIN_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login must succeed");

    let set_cookie = headers
        .get(header::SET_COOKIE)
        .expect("login sets a cookie")
        .to_str()
        .expect("cookie is ascii");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}
