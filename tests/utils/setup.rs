use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use outreach::{
    auth::token::TokenConfig,
    note::repository::InMemoryNoteRepository,
    retreat::repository::InMemoryRetreatRepository,
    servantee::repository::InMemoryServanteeRepository,
    shared::AppState,
    user::repository::InMemoryUserRepository,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// The full application router over in-memory repositories, driven request
/// by request without a listening socket.
pub struct TestApp {
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let app_state = AppState::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryServanteeRepository::new()),
            Arc::new(InMemoryRetreatRepository::new()),
            Arc::new(InMemoryNoteRepository::new()),
            TokenConfig::for_tests(),
        );

        Self {
            router: outreach::router(app_state),
        }
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: Value,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::empty()).unwrap();

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, body)
    }

    // ------------------------------------------------------------------
    // Auth flow shorthand
    // ------------------------------------------------------------------

    pub async fn register(&self, email: &str, password: &str, role: &str) -> (StatusCode, Value) {
        self.post_json(
            "/auth/register",
            json!({ "email": email, "password": password, "role": role }),
            None,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_json(
            "/auth/login",
            json!({ "email": email, "password": password }),
            None,
        )
        .await
    }

    /// Registers and logs in, returning (access_token, refresh_token)
    pub async fn login_as(&self, email: &str, password: &str, role: &str) -> (String, String) {
        let (status, _) = self.register(email, password, role).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK);

        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn refresh(&self, refresh_token: &str) -> (StatusCode, Value) {
        self.post_json(
            "/auth/refresh",
            json!({ "refresh_token": refresh_token }),
            None,
        )
        .await
    }

    pub async fn logout(&self, access_token: &str) -> (StatusCode, Value) {
        self.post_json("/auth/logout", json!({}), Some(access_token))
            .await
    }
}
