#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use tour_cms::{
    AppConfig, AppState, InMemoryRepository, MockStorageService, create_router,
    models::NewUser,
    password::hash_password,
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use uuid::Uuid;

pub const BOUNDARY: &str = "X-TOUR-CMS-TEST-BOUNDARY";
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-bytes";
pub const PDF_BYTES: &[u8] = b"%PDF-1.4 fake program";

/// A router over the in-memory repository and mock storage, plus handles to both.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepository>,
    pub storage: MockStorageService,
    /// An existing user, usable through the local `x-user-id` bypass.
    pub user_id: Uuid,
}

pub async fn test_app() -> TestApp {
    test_app_with(MockStorageService::new()).await
}

pub async fn test_app_with(storage: MockStorageService) -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    let user = repo
        .create_user(NewUser {
            username: "editor".to_string(),
            email: "editor@example.com".to_string(),
            password_hash: hash_password("s3cret-pass").unwrap(),
        })
        .await
        .unwrap();

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        storage: Arc::new(storage.clone()) as StorageState,
        config: AppConfig::default(),
    };

    TestApp {
        router: create_router(state),
        repo,
        storage,
        user_id: user.id,
    }
}

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn image(self, name: &str) -> Self {
        self.file(name, "picture.png", "image/png", PNG_BYTES)
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.bytes
    }
}

/// A complete, valid tour form.
pub fn tour_form(name: &str) -> MultipartBody {
    MultipartBody::new()
        .text("name", name)
        .text("airline", "Sky Air")
        .text("start_date", "2025-06-01")
        .text("end_date", "2025-06-08")
        .text("price", "1499.90")
        .text("description", "Seven nights, half board.")
        .image("thumbnail")
}

/// Sends a request and decodes the body as JSON (`Value::Null` when empty).
pub async fn call(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn get(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    call(app, request).await
}

/// Sends a multipart write as the seeded user.
pub async fn send_form(
    app: &TestApp,
    method: Method,
    uri: &str,
    form: MultipartBody,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", app.user_id.to_string())
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(form.finish()))
        .unwrap();
    call(app, request).await
}

pub async fn delete(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header("x-user-id", app.user_id.to_string())
        .body(Body::empty())
        .unwrap();
    call(app, request).await
}

pub async fn post_json(app: &TestApp, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    call(app, request).await
}

/// Creates a region through the API and returns its JSON.
pub async fn create_region(app: &TestApp, name: &str, is_active: bool) -> Value {
    let form = MultipartBody::new()
        .text("name", name)
        .text("is_active", if is_active { "true" } else { "false" });
    let (status, body) = send_form(app, Method::POST, "/regions", form).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}
