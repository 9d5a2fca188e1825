mod helpers;

use chrono::{Duration, Utc};

#[tokio::test]
async fn fresh_device_gets_documented_defaults() {
    let base = helpers::spawn_server().await;
    let client = helpers::api_client(&base, "fresh-device");

    let stats = client.get_stats().await.unwrap();
    assert_eq!(stats.items_saved, 0);
    assert_eq!(stats.days_active, 1);
    assert_eq!(stats.xp, 0);
    assert!(Utc::now() - stats.join_date < Duration::seconds(5));
    assert!(Utc::now() - stats.last_login < Duration::seconds(5));
}

#[tokio::test]
async fn repeated_same_day_fetches_do_not_inflate_days_active() {
    let base = helpers::spawn_server().await;
    let client = helpers::api_client(&base, "dev-1");

    let first = client.get_stats().await.unwrap();
    let second = client.get_stats().await.unwrap();
    assert_eq!(first.days_active, 1);
    assert_eq!(second.days_active, 1);
    assert_eq!(first.join_date, second.join_date);
}

#[tokio::test]
async fn two_xp_awards_accumulate() {
    let base = helpers::spawn_server().await;
    let client = helpers::api_client(&base, "dev-xp");

    client.add_xp(15).await.unwrap();
    let stats = client.add_xp(15).await.unwrap();
    assert_eq!(stats.xp, 30);

    // and the total survives a fresh fetch
    assert_eq!(client.get_stats().await.unwrap().xp, 30);
}

#[tokio::test]
async fn missing_amount_defaults_to_zero() {
    let base = helpers::spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/stats/xp"))
        .header("x-device-id", "dev-empty")
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["stats"]["xp"], 0);
}
