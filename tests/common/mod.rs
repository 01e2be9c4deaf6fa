#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::NaiveDate;
use library_api::{
    auth::{AUTH_ROLE_HEADER, AUTH_USER_HEADER},
    config::AppConfig,
    db,
    entities::{book, student, Department},
    events::{self, EventSender},
    services::{CreateBookRequest, CreateStudentRequest},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

pub const LIBRARIAN: &str = "librarian";

/// A fixed lending day so return dates are predictable
pub fn lending_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).expect("valid date")
}

/// Application state backed by a fresh SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _dir: Option<tempfile::TempDir>,
}

impl TestApp {
    /// In-memory database behind a single connection.
    pub async fn new() -> Self {
        Self::with_database_url("sqlite::memory:".to_string(), None).await
    }

    /// File database in a temp dir behind a full connection pool, so
    /// transactions really run side by side.
    pub async fn on_disk() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("library.db").display());
        Self::with_database_url(url, Some(dir)).await
    }

    async fn with_database_url(database_url: String, dir: Option<tempfile::TempDir>) -> Self {
        let mut cfg = AppConfig::new(
            database_url,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = library_api::app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _dir: dir,
        }
    }

    pub fn event_sender(&self) -> Arc<EventSender> {
        self.state.event_sender.clone()
    }

    /// Send a request with optional caller identity headers.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        caller: Option<(&str, &str)>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some((user, role)) = caller {
            builder = builder
                .header(AUTH_USER_HEADER, user)
                .header(AUTH_ROLE_HEADER, role);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for requests made by the librarian.
    pub async fn as_librarian(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some((LIBRARIAN, "librarian")))
            .await
    }

    pub async fn seed_book(&self, isbn: &str, quantity: i32) -> book::Model {
        self.state
            .services
            .catalog
            .create_book(CreateBookRequest {
                title: format!("Book {}", isbn),
                author: "Test Author".to_string(),
                isbn: isbn.to_string(),
                quantity,
            })
            .await
            .expect("seed book for tests")
    }

    pub async fn seed_student(&self, name: &str, id_number: &str) -> student::Model {
        self.state
            .services
            .roster
            .create_student(CreateStudentRequest {
                name: name.to_string(),
                id_number: id_number.to_string(),
                department: Department::Science,
                phone_number: String::new(),
            })
            .await
            .expect("seed student for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is json")
}
