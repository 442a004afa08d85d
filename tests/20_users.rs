mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn create_user_is_idempotent() -> Result<()> {
    let app = TestApp::new()?;
    let body = json!({ "email": "new@x.com", "name": "New", "photoURL": "https://img/1.png" });

    let first = app.post("/users", None, body.clone()).await?;
    assert_eq!(first.status, StatusCode::OK);
    assert!(first.body["insertedId"].is_string());

    let second = app.post("/users", None, body).await?;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["message"], "user already exists");
    assert!(second.body["insertedId"].is_null());

    let stats = app.get("/user-stats", None).await?;
    assert_eq!(stats.body["totalUsers"], 1);
    Ok(())
}

#[tokio::test]
async fn create_user_rejects_blank_email() -> Result<()> {
    let app = TestApp::new()?;
    let res = app.post("/users", None, json!({ "email": "  " })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn admin_lists_users_page_by_page() -> Result<()> {
    let app = TestApp::new()?;
    app.register_admin("boss@x.com").await?;
    for i in 0..4 {
        app.register(&format!("u{}@x.com", i)).await?;
    }
    let token = app.token_for("boss@x.com")?;

    let page = app.get("/users?page=2&limit=2", Some(&token)).await?;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["total"], 5);
    assert_eq!(page.body["page"], 2);
    assert_eq!(page.body["limit"], 2);
    assert_eq!(page.body["users"].as_array().map(Vec::len), Some(2));

    let last = app.get("/users?page=3&limit=2", Some(&token)).await?;
    assert_eq!(last.body["users"].as_array().map(Vec::len), Some(1));

    let junk = app.get("/users?page=abc&limit=-3", Some(&token)).await?;
    assert_eq!(junk.body["page"], 1);
    assert_eq!(junk.body["limit"], 10);
    Ok(())
}

#[tokio::test]
async fn patch_only_touches_profile_fields() -> Result<()> {
    let app = TestApp::new()?;
    app.register("me@x.com").await?;
    let token = app.token_for("me@x.com")?;

    let res = app
        .patch(
            "/users/me@x.com",
            Some(&token),
            Some(json!({ "name": "Renamed", "role": "admin", "isPremium": true })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["modifiedCount"], 1);

    let account = app.state.accounts.find_by_email("me@x.com").await?.expect("account");
    assert_eq!(account.name.as_deref(), Some("Renamed"));
    assert!(!account.is_admin());
    assert!(!account.is_premium);
    Ok(())
}

#[tokio::test]
async fn patch_without_writable_fields_still_reports_match() -> Result<()> {
    let app = TestApp::new()?;
    app.register("me@x.com").await?;
    let token = app.token_for("me@x.com")?;

    let res = app.patch("/users/me@x.com", Some(&token), Some(json!({ "role": "admin" }))).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["matchedCount"], 1);
    assert_eq!(res.body["modifiedCount"], 0);

    let account = app.state.accounts.find_by_email("me@x.com").await?.expect("account");
    assert!(!account.is_admin());
    Ok(())
}

#[tokio::test]
async fn patch_of_someone_else_is_forbidden() -> Result<()> {
    let app = TestApp::new()?;
    app.register("me@x.com").await?;
    app.register("you@x.com").await?;
    let token = app.token_for("me@x.com")?;

    let res = app.patch("/users/you@x.com", Some(&token), Some(json!({ "name": "x" }))).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_promotes_by_id() -> Result<()> {
    let app = TestApp::new()?;
    app.register_admin("boss@x.com").await?;
    let id = app.register("rookie@x.com").await?;
    let token = app.token_for("boss@x.com")?;

    let res = app.patch(&format!("/users/admin/{}", id), Some(&token), None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["modifiedCount"], 1);

    let bad = app.patch("/users/admin/not-a-uuid", Some(&token), None).await?;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let rookie = app.token_for("rookie@x.com")?;
    let status = app.get("/users/admin/rookie@x.com", Some(&rookie)).await?;
    assert_eq!(status.body["admin"], true);
    Ok(())
}

#[tokio::test]
async fn premium_activation_updates_stats() -> Result<()> {
    let app = TestApp::new()?;
    app.register("paid@x.com").await?;
    app.register("free@x.com").await?;
    let token = app.token_for("paid@x.com")?;

    let res = app
        .patch(
            "/users/premium/paid@x.com",
            Some(&token),
            Some(json!({ "subscriptionPlan": "monthly", "premiumExpiry": "2099-01-01T00:00:00Z" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);

    let stats = app.get("/user-stats", None).await?;
    assert_eq!(stats.body["totalUsers"], 2);
    assert_eq!(stats.body["premiumUsers"], 1);
    assert_eq!(stats.body["normalUsers"], 1);

    let bad = app
        .patch(
            "/users/premium/paid@x.com",
            Some(&token),
            Some(json!({ "subscriptionPlan": "monthly", "premiumExpiry": "next tuesday" })),
        )
        .await?;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    Ok(())
}
