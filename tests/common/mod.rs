#![allow(dead_code)]

use anyhow::Result;
use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use forum_api::auth::{generate_jwt, Claims};
use forum_api::config::AppConfig;
use forum_api::database::DatabaseManager;
use forum_api::services::{ledger, QaService};
use forum_api::AppState;

/// Development configuration, optionally pointed at `DATABASE_URL`.
pub fn test_config(database_url: Option<&str>) -> AppConfig {
    let url = database_url.map(str::to_string);
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => url.clone(),
        "UPLOAD_ROOT" => Some(
            std::env::temp_dir()
                .join("forum-api-test-uploads")
                .to_string_lossy()
                .into_owned(),
        ),
        _ => None,
    })
    .expect("development config is valid")
}

/// App state over a pool that never connects; for requests rejected before storage.
pub fn offline_state() -> AppState {
    let config = test_config(None);
    let pool = DatabaseManager::connect_lazy(&config.database).expect("lazy pool");
    AppState::new(pool, config)
}

pub fn bearer(state: &AppState, user_id: i64, username: &str) -> String {
    let security = &state.config.security;
    let claims = Claims::new(user_id, username, security.jwt_expiry_hours);
    let token = generate_jwt(&claims, &security.jwt_secret).expect("token");
    format!("Bearer {}", token)
}

/// Drive one request through the router and decode the JSON body (Null when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (axum::http::StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

/// A multipart form; each part is `(name, file_name, bytes)` and a `None`
/// file name makes a plain text field.
pub fn multipart_request(uri: &str, auth: Option<&str>, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    const BOUNDARY: &str = "forum-api-test-boundary";
    let mut body = Vec::new();
    for (name, file_name, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body)).expect("request")
}

/// Regular files below `dir`, recursively; empty when it does not exist.
pub fn files_under(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else { return Vec::new() };
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files
}

/// A throw-away schema with the forum migrations applied.
pub struct TestDb {
    pub pool: PgPool,
    pub config: AppConfig,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    /// None when DATABASE_URL is not configured; the caller should return early.
    pub async fn create() -> Result<Option<Self>> {
        let _ = dotenvy::dotenv();
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping database-backed test");
            return Ok(None);
        };

        let mut config = test_config(Some(&url));
        let schema = format!("forum_test_{}", Uuid::new_v4().simple());
        config.uploads.root = std::path::Path::new(&config.uploads.root)
            .join(&schema)
            .to_string_lossy()
            .into_owned();

        let admin = DatabaseManager::connect(&config.database).await?;
        DatabaseManager::create_schema(&admin, &schema).await?;
        let pool = DatabaseManager::connect_to_schema(&config.database, &schema).await?;
        DatabaseManager::migrate(&pool).await?;

        Ok(Some(Self {
            pool,
            config,
            admin,
            schema,
        }))
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.pool.clone(), self.config.clone())
    }

    pub fn qa(&self) -> QaService {
        QaService::new(self.pool.clone(), self.config.points)
    }

    /// Insert a user directly with a starting balance.
    pub async fn user(&self, username: &str, points: i64) -> Result<i64> {
        let id = sqlx::query_scalar(
            "INSERT INTO users (username, email, password_hash, points) VALUES ($1, $2, 'x$y', $3) RETURNING id",
        )
        .bind(username)
        .bind(format!("{}@example.com", username))
        .bind(points)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn points(&self, user_id: i64) -> Result<i64> {
        Ok(ledger::balance(&self.pool, user_id).await?)
    }

    /// Id of the first seeded category.
    pub async fn category(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT MIN(id) FROM categories")
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn count(&self, sql: &str) -> Result<i64> {
        Ok(sqlx::query_scalar(sql).fetch_one(&self.pool).await?)
    }

    pub fn upload_root(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.config.uploads.root)
    }

    pub async fn cleanup(self) -> Result<()> {
        let _ = std::fs::remove_dir_all(self.upload_root());
        self.pool.close().await;
        DatabaseManager::drop_schema(&self.admin, &self.schema).await?;
        self.admin.close().await;
        Ok(())
    }
}
