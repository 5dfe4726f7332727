mod common;

use anyhow::Result;
use chrono::Duration;
use lms_api::auth::{generate_jwt, Claims, TokenKind};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.client.get(app.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_then_login_returns_tokens_and_profile() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.register("ada").await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "message": "User created successfully" }));

    let res = app.login("ada", common::PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let mut keys: Vec<&str> = body.as_object().map(|o| o.keys().map(String::as_str).collect()).unwrap_or_default();
    keys.sort_unstable();
    assert_eq!(keys, ["access", "refresh", "user"]);
    assert!(body["access"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refresh"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["username"], "ada");
    assert_eq!(body["user"]["reward"], 0);
    assert!(body["user"].get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_username_and_email_are_field_errors() -> Result<()> {
    let app = common::spawn_app().await?;
    app.register("ada").await?;

    let res = app.register("ada").await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["username"].is_array());
    assert!(body["email"].is_array());
    Ok(())
}

#[tokio::test]
async fn register_validates_fields() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app
        .post_json(
            "/api/auth/register",
            &json!({ "username": "a b", "email": "not-an-email", "password": "short" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["username"].is_array());
    assert!(body["email"].is_array());
    assert!(body["password"].is_array());
    assert!(body.get("code").is_none());

    let res = app.post_json("/api/auth/register", &json!({})).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["username"][0], "This field is required.");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app
        .client
        .post(app.url("/api/auth/register"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn login_failures() -> Result<()> {
    let app = common::spawn_app().await?;
    app.register("ada").await?;

    let res = app.login("ada", "wrong-password").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.login("nobody", common::PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.post_json("/api/auth/login", &json!({ "username": "ada" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["password"].is_array());
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_bearer_token() -> Result<()> {
    let app = common::spawn_app().await?;

    for path in ["/api/profile", "/api/projects", "/api/notifications", "/api/reward"] {
        let res = app.client.get(app.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }

    let res = app
        .client
        .get(app.url("/api/profile"))
        .bearer_auth("not.a.token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let res = app
        .client
        .get(app.url("/api/profile"))
        .bearer_auth(&session.refresh)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "TOKEN_WRONG_TYPE");
    Ok(())
}

#[tokio::test]
async fn refresh_issues_new_access_token() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let res = app
        .post_json("/api/auth/token/refresh", &json!({ "refresh": session.refresh }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let access = body["access"].as_str().unwrap_or_default().to_string();

    let res = app.client.get(app.url("/api/profile")).bearer_auth(&access).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.post_json("/api/auth/token/refresh", &json!({})).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "TOKEN_MISSING");
    Ok(())
}

#[tokio::test]
async fn logout_revokes_refresh_token() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let res = app
        .post(&session, "/api/auth/logout", &json!({ "refresh": session.refresh }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "message": "Logged out successfully" }));

    // Revoked token can no longer mint access tokens
    let res = app
        .post_json("/api/auth/token/refresh", &json!({ "refresh": session.refresh }))
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "TOKEN_REVOKED");

    // Second logout with the same token
    let res = app
        .post(&session, "/api/auth/logout", &json!({ "refresh": session.refresh }))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "TOKEN_REVOKED");
    Ok(())
}

#[tokio::test]
async fn logout_rejections_have_distinct_codes() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let cases = [
        (json!({}), "TOKEN_MISSING"),
        (json!({ "refresh": "" }), "TOKEN_MISSING"),
        (json!({ "refresh": "garbage" }), "TOKEN_MALFORMED"),
        (json!({ "refresh": session.access }), "TOKEN_WRONG_TYPE"),
    ];
    for (body, code) in cases {
        let res = app.post(&session, "/api/auth/logout", &body).await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", code);
        let body: Value = res.json().await?;
        assert_eq!(body["code"], code);
    }

    let user_id = Uuid::parse_str(&session.user_id)?;
    let expired = generate_jwt(&Claims::with_lifetime(
        user_id,
        "ada",
        TokenKind::Refresh,
        Duration::seconds(-60),
    ))?;
    let res = app.post(&session, "/api/auth/logout", &json!({ "refresh": expired })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "TOKEN_EXPIRED");
    Ok(())
}

#[tokio::test]
async fn logout_without_json_body_reports_missing_token() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let res = app
        .client
        .post(app.url("/api/auth/logout"))
        .bearer_auth(&session.access)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "TOKEN_MISSING");

    let res = app
        .client
        .post(app.url("/api/auth/logout"))
        .bearer_auth(&session.access)
        .header("content-type", "text/plain")
        .body(session.refresh.clone())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "TOKEN_MISSING");
    Ok(())
}

#[tokio::test]
async fn logout_with_another_users_token_is_forbidden() -> Result<()> {
    let app = common::spawn_app().await?;
    let ada = app.signup("ada").await?;
    let bob = app.signup("bob").await?;

    let res = app
        .post(&ada, "/api/auth/logout", &json!({ "refresh": bob.refresh }))
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Bob's token was left alone
    let res = app
        .post_json("/api/auth/token/refresh", &json!({ "refresh": bob.refresh }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_requires_authentication() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let res = app
        .post_json("/api/auth/logout", &json!({ "refresh": session.refresh }))
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
