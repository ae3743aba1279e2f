#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use foodgram::api::{self, AppState};
use foodgram::config::Config;
use foodgram::db::Store;
use foodgram::models::catalog::{IngredientRecord, TagRecord};
use foodgram::state::SharedState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

pub const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub struct TestApp {
    pub app: NormalizePath<Router>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn store(&self) -> &Store {
        self.state.store()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let response = self.send(build("GET", uri, token, None)).await;
        read_json(response).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let response = self.send(build("POST", uri, token, Some(body))).await;
        read_json(response).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let response = self.send(build("PATCH", uri, token, Some(body))).await;
        read_json(response).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let response = self.send(build("DELETE", uri, token, None)).await;
        read_json(response).await
    }

    /// Register a user and return `(id, token)`.
    pub async fn user(&self, name: &str) -> (i64, String) {
        let (status, body) = self
            .post(
                "/api/users",
                None,
                json!({
                    "email": format!("{name}@example.com"),
                    "username": name,
                    "first_name": "Test",
                    "last_name": "User",
                    "password": "s3cret-pass",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let id = body["id"].as_i64().unwrap();

        let (status, body) = self
            .post(
                "/api/auth/token/login",
                None,
                json!({"email": format!("{name}@example.com"), "password": "s3cret-pass"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        (id, body["auth_token"].as_str().unwrap().to_string())
    }

    /// Create a recipe with the given `(ingredient_id, amount)` lines.
    pub async fn recipe(&self, token: &str, name: &str, tags: &[i64], lines: &[(i64, i64)]) -> i64 {
        let ingredients: Vec<Value> = lines
            .iter()
            .map(|(id, amount)| json!({"id": id, "amount": amount}))
            .collect();

        let (status, body) = self
            .post(
                "/api/recipes",
                Some(token),
                json!({
                    "name": name,
                    "text": "Mix and serve.",
                    "cooking_time": 10,
                    "image": PNG,
                    "tags": tags,
                    "ingredients": ingredients,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create recipe failed: {body}");
        body["id"].as_i64().unwrap()
    }
}

pub fn build(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, body)
}

/// Fresh app on its own SQLite file and media dir, with the catalog seeded.
pub async fn spawn_app() -> TestApp {
    let root = std::env::temp_dir().join(format!("foodgram-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&root).unwrap();

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", root.join("foodgram.db").display());
    config.general.media_path = root.join("media").display().to_string();
    config.observability.metrics_enabled = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.argon2_parallelism = 1;

    let store = Store::with_pool_options(&config.general.database_path, 2, 1)
        .await
        .expect("Failed to open store");

    store
        .upsert_tags(vec![
            TagRecord {
                name: "Breakfast".into(),
                color: "#E26C2D".into(),
                slug: "breakfast".into(),
            },
            TagRecord {
                name: "Dinner".into(),
                color: "#49B64E".into(),
                slug: "dinner".into(),
            },
        ])
        .await
        .unwrap();
    store
        .upsert_ingredients(vec![
            IngredientRecord {
                name: "Salt".into(),
                measurement_unit: "g".into(),
            },
            IngredientRecord {
                name: "Sugar".into(),
                measurement_unit: "g".into(),
            },
            IngredientRecord {
                name: "Milk".into(),
                measurement_unit: "ml".into(),
            },
        ])
        .await
        .unwrap();

    let shared = Arc::new(SharedState::with_store(config, store));
    let state = api::create_app_state(shared, None);

    TestApp {
        app: api::app(state.clone()),
        state,
    }
}

/// Look up a seeded catalog id by name.
pub async fn ingredient_id(app: &TestApp, name: &str) -> i64 {
    let (_, body) = app
        .get(&format!("/api/ingredients?name={name}"), None)
        .await;
    body.as_array()
        .unwrap()
        .iter()
        .find(|i| i["name"] == name)
        .and_then(|i| i["id"].as_i64())
        .unwrap()
}

pub async fn tag_id(app: &TestApp, slug: &str) -> i64 {
    let (_, body) = app.get("/api/tags", None).await;
    body.as_array()
        .unwrap()
        .iter()
        .find(|t| t["slug"] == slug)
        .and_then(|t| t["id"].as_i64())
        .unwrap()
}
