mod helpers;

use chrono::{Duration, Utc};
use lorebook::model::{ItemKind, NewLibraryItem};

fn new_item(title: &str, category: &str) -> NewLibraryItem {
    NewLibraryItem {
        title: title.into(),
        content: format!("everything about {title}"),
        category: category.into(),
        ..NewLibraryItem::default()
    }
}

#[tokio::test]
async fn saving_an_item_generates_identity_and_syncs_the_counter() {
    let base = helpers::spawn_server().await;
    let client = helpers::api_client(&base, "dev-1");

    let item = client
        .create_library_item(&new_item("Gear Drive", "Physics"))
        .await
        .unwrap();
    assert!(!item.id.is_empty());
    assert!(Utc::now() - item.created_at < Duration::seconds(5));
    assert_eq!(item.kind, ItemKind::Card);

    // follow-up list has the item first
    let items = client.list_library().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, item.id);
    assert_eq!(items[0].category, "Physics");

    // derived counter matches the live row count
    let stats = client.get_stats().await.unwrap();
    assert_eq!(stats.items_saved, 1);
}

#[tokio::test]
async fn list_is_newest_first() {
    let base = helpers::spawn_server().await;
    let client = helpers::api_client(&base, "dev-1");

    client.create_library_item(&new_item("first", "general")).await.unwrap();
    client.create_library_item(&new_item("second", "general")).await.unwrap();
    let newest = client
        .create_library_item(&new_item("third", "general"))
        .await
        .unwrap();

    let items = client.list_library().await.unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].id, newest.id);
    assert_eq!(items[2].title, "first");
}

#[tokio::test]
async fn delete_returns_the_remaining_list_and_resyncs_the_counter() {
    let base = helpers::spawn_server().await;
    let client = helpers::api_client(&base, "dev-1");

    let doomed = client.create_library_item(&new_item("doomed", "general")).await.unwrap();
    let kept = client.create_library_item(&new_item("kept", "general")).await.unwrap();

    let remaining = client.delete_library_item(&doomed.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.id);

    assert_eq!(client.get_stats().await.unwrap().items_saved, 1);
}

#[tokio::test]
async fn optimize_images_strips_inline_thumbnails_only() {
    let base = helpers::spawn_server().await;
    let client = helpers::api_client(&base, "dev-1");

    let mut inline = new_item("heavy", "general");
    inline.thumbnail = Some("data:image/jpeg;base64,AAAA".into());
    let mut linked = new_item("light", "general");
    linked.thumbnail = Some("https://cdn.example.com/owl.png".into());
    client.create_library_item(&inline).await.unwrap();
    client.create_library_item(&linked).await.unwrap();

    let optimized = client.optimize_images().await.unwrap();
    assert_eq!(optimized, 1);

    let items = client.list_library().await.unwrap();
    let heavy = items.iter().find(|i| i.title == "heavy").unwrap();
    let light = items.iter().find(|i| i.title == "light").unwrap();
    assert_eq!(heavy.thumbnail, None);
    assert_eq!(light.thumbnail.as_deref(), Some("https://cdn.example.com/owl.png"));
}

#[tokio::test]
async fn defaults_apply_to_a_minimal_payload() {
    let base = helpers::spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/library"))
        .header("x-device-id", "dev-min")
        .json(&serde_json::json!({ "item": { "title": "Just a title" } }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["item"]["kind"], "card");
    assert_eq!(body["item"]["category"], "general");
    assert!(body["item"].get("thumbnail").is_none());
}
