mod common;

use anyhow::Result;
use futures::future::join_all;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn completing_a_project_awards_points_once() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;
    assert_eq!(app.reward(&session).await?, 0);

    let project = app.create_project(&session, json!({ "title": "P" })).await?;
    let path = format!("/api/projects/{}", project["id"].as_str().unwrap_or_default());

    let res = app.patch(&session, &path, &json!({ "completed": true })).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["completed"], true);
    assert!(body["completed_at"].is_string());
    assert_eq!(app.reward(&session).await?, 3);

    let res = app.patch(&session, &path, &json!({ "completed": true })).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.reward(&session).await?, 3);

    // Profile reflects the same balance
    let body: Value = app.get(&session, "/api/profile").await?.json().await?;
    assert_eq!(body["reward"], 3);
    Ok(())
}

#[tokio::test]
async fn reward_body_is_just_the_points() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let res = app.get(&session, "/api/reward").await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "points": 0 }));
    Ok(())
}

#[tokio::test]
async fn string_completed_flag_counts_as_completion() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let project = app.create_project(&session, json!({ "title": "P" })).await?;
    let path = format!("/api/projects/{}", project["id"].as_str().unwrap_or_default());

    let res = app.patch(&session, &path, &json!({ "completed": "true" })).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["completed"], true);
    assert_eq!(app.reward(&session).await?, 3);

    let res = app.patch(&session, &path, &json!({ "completed": "maybe" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.reward(&session).await?, 3);
    Ok(())
}

#[tokio::test]
async fn reopening_never_deducts_points() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let project = app.create_project(&session, json!({ "title": "P" })).await?;
    let path = format!("/api/projects/{}", project["id"].as_str().unwrap_or_default());

    app.patch(&session, &path, &json!({ "completed": true })).await?;
    let res = app.patch(&session, &path, &json!({ "completed": false })).await?;
    let body: Value = res.json().await?;
    assert_eq!(body["completed"], false);
    assert!(body["completed_at"].is_null());
    assert_eq!(app.reward(&session).await?, 3);

    // A fresh open → completed transition counts again
    app.patch(&session, &path, &json!({ "completed": true })).await?;
    assert_eq!(app.reward(&session).await?, 6);
    Ok(())
}

#[tokio::test]
async fn creating_a_completed_project_awards_nothing() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let project = app
        .create_project(&session, json!({ "title": "already done", "completed": true }))
        .await?;
    assert_eq!(project["completed"], true);

    let path = format!("/api/projects/{}", project["id"].as_str().unwrap_or_default());
    app.patch(&session, &path, &json!({ "completed": true })).await?;
    assert_eq!(app.reward(&session).await?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_completions_are_not_lost() -> Result<()> {
    let app = common::spawn_app().await?;
    let session = app.signup("ada").await?;

    let mut paths = Vec::new();
    for i in 0..8 {
        let project = app.create_project(&session, json!({ "title": format!("P{}", i) })).await?;
        paths.push(format!("/api/projects/{}", project["id"].as_str().unwrap_or_default()));
    }

    // Each project completed twice at once; only one of each pair may score
    let body = json!({ "completed": true });
    let requests = paths
        .iter()
        .chain(paths.iter())
        .map(|path| app.patch(&session, path, &body));
    for res in join_all(requests).await {
        assert_eq!(res?.status(), StatusCode::OK);
    }

    assert_eq!(app.reward(&session).await?, 8 * 3);
    Ok(())
}
