#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use lms_api::database::MemoryStore;
use lms_api::{app, AppState};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};

pub const PASSWORD: &str = "correct-horse-battery";

/// One server per test: each gets a fresh in-memory store on its own port,
/// running on the test's runtime.
pub struct TestApp {
    pub port: u16,
    pub base_url: String,
    pub client: Client,
}

/// Credentials of a registered + logged-in user
pub struct Session {
    pub username: String,
    pub user_id: String,
    pub access: String,
    pub refresh: String,
}

pub async fn spawn_app() -> Result<TestApp> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let router = app(AppState::new(Arc::new(MemoryStore::new())));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let test_app = TestApp {
        port,
        base_url,
        client: Client::new(),
    };
    test_app.wait_ready(Duration::from_secs(10)).await?;
    Ok(test_app)
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    pub async fn register(&self, username: &str) -> Result<Response> {
        self.post_json(
            "/api/auth/register",
            &json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
                "first_name": "Test",
                "last_name": "User"
            }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Response> {
        self.post_json("/api/auth/login", &json!({ "username": username, "password": password }))
            .await
    }

    /// Register `username` and log in, returning both tokens
    pub async fn signup(&self, username: &str) -> Result<Session> {
        let res = self.register(username).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let res = self.login(username, PASSWORD).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;

        Ok(Session {
            username: username.to_string(),
            user_id: body["user"]["id"].as_str().context("missing user id")?.to_string(),
            access: body["access"].as_str().context("missing access token")?.to_string(),
            refresh: body["refresh"].as_str().context("missing refresh token")?.to_string(),
        })
    }

    pub async fn get(&self, session: &Session, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).bearer_auth(&session.access).send().await?)
    }

    pub async fn post(&self, session: &Session, path: &str, body: &Value) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(&session.access)
            .json(body)
            .send()
            .await?)
    }

    pub async fn put(&self, session: &Session, path: &str, body: &Value) -> Result<Response> {
        Ok(self
            .client
            .put(self.url(path))
            .bearer_auth(&session.access)
            .json(body)
            .send()
            .await?)
    }

    pub async fn patch(&self, session: &Session, path: &str, body: &Value) -> Result<Response> {
        Ok(self
            .client
            .patch(self.url(path))
            .bearer_auth(&session.access)
            .json(body)
            .send()
            .await?)
    }

    pub async fn delete(&self, session: &Session, path: &str) -> Result<Response> {
        Ok(self.client.delete(self.url(path)).bearer_auth(&session.access).send().await?)
    }

    /// Create a project and return its JSON representation
    pub async fn create_project(&self, session: &Session, body: Value) -> Result<Value> {
        let res = self.post(session, "/api/projects", &body).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());
        Ok(res.json().await?)
    }

    pub async fn reward(&self, session: &Session) -> Result<i64> {
        let body: Value = self.get(session, "/api/reward").await?.json().await?;
        body["points"].as_i64().context("missing points")
    }
}
