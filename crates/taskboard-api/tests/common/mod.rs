use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use taskboard_api::{AppState, AppStateInner, router};
use taskboard_core::notifier::{DispatchError, Notifier};
use taskboard_core::session::SessionKeys;
use taskboard_db::Database;
use taskboard_types::notify::NoticeKind;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Records every delivery for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(NoticeKind, i64, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, kind: NoticeKind, chat_id: i64, text: &str) -> Result<(), DispatchError> {
        self.sent.lock().unwrap().push((kind, chat_id, text.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    #[allow(dead_code)]
    pub state: AppState,
    #[allow(dead_code)]
    pub db: Arc<Database>,
    #[allow(dead_code)]
    pub notifier: Arc<RecordingNotifier>,
}

/// Create a test app backed by an in-memory database.
pub fn create_test_app() -> TestApp {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = Arc::new(AppStateInner::new(
        db.clone(),
        SessionKeys::with_default_ttls(TEST_SECRET),
        notifier.clone(),
        4,
    ));

    TestApp {
        router: router(state.clone()),
        state,
        db,
        notifier,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.send(json_request(method, uri, token, body)).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// Registers and logs in; returns (user_id, access_token).
    #[allow(dead_code)]
    pub async fn signup(&self, username: &str) -> (i64, String) {
        let (status, _) = self
            .call(
                "POST",
                "/user/register",
                None,
                Some(json!({ "username": username, "password": "pw", "tg_name": format!("{username}_tg") })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .call(
                "POST",
                "/user/login",
                None,
                Some(json!({ "username": username, "password": "pw" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        (
            body["user_id"].as_i64().unwrap(),
            body["access_token"].as_str().unwrap().to_string(),
        )
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers<B>(response: &Response<B>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}
