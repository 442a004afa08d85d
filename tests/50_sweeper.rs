mod common;

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde_json::json;

use common::TestApp;
use newswave_api::services::{SubscriptionSweeper, SystemClock};

#[tokio::test]
async fn sweep_downgrades_only_lapsed_subscriptions() -> Result<()> {
    let app = TestApp::new()?;
    app.register("lapsed@x.com").await?;
    app.register("active@x.com").await?;

    let yesterday = (Utc::now() - Duration::days(1)).to_rfc3339();
    let next_year = (Utc::now() + Duration::days(365)).to_rfc3339();
    for (email, expiry) in [("lapsed@x.com", yesterday), ("active@x.com", next_year)] {
        let token = app.token_for(email)?;
        app.patch(
            &format!("/users/premium/{}", email),
            Some(&token),
            Some(json!({ "subscriptionPlan": "monthly", "premiumExpiry": expiry })),
        )
        .await?;
    }

    let sweeper = SubscriptionSweeper::new(app.state.accounts.clone(), Arc::new(SystemClock));
    assert_eq!(sweeper.run_once().await?, 1);

    let lapsed = app.state.accounts.find_by_email("lapsed@x.com").await?.expect("account");
    assert!(!lapsed.is_premium);
    assert!(lapsed.premium_expiry.is_none());

    let stats = app.get("/user-stats", None).await?;
    assert_eq!(stats.body["premiumUsers"], 1);

    // Lapsed user is back under the posting limit
    app.submit_article("lapsed@x.com", "One", &[]).await?;
    let token = app.token_for("lapsed@x.com")?;
    let second = app
        .post("/articles", Some(&token), json!({ "title": "Two", "author_email": "lapsed@x.com" }))
        .await?;
    assert_eq!(second.body["error"], "Normal users can only post one article");
    Ok(())
}
