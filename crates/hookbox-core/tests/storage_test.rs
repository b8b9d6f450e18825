//! Integration tests for the message repository against real SQLite.

use hookbox_core::{CoreError, MessageFilter};
use hookbox_testing::{MessageBuilder, TestEnv};

fn message(id: &str, from: &str, ts: &str, text: Option<&str>) -> hookbox_core::Message {
    let builder = MessageBuilder::with_defaults().message_id(id).from(from).ts(ts);
    let builder = match text {
        Some(text) => builder.text(text),
        None => builder.without_text(),
    };
    builder.into_message()
}

async fn seed(env: &TestEnv, messages: &[hookbox_core::Message]) {
    for message in messages {
        env.storage().messages.insert(message).await.unwrap();
    }
}

#[tokio::test]
async fn insert_then_find_round_trips_all_fields() {
    let env = TestEnv::new().await.unwrap();
    let stored = message("m1", "+111", "2025-01-15T10:00:00Z", None);

    env.storage().messages.insert(&stored).await.unwrap();

    let found = env.storage().messages.find_by_id("m1").await.unwrap();
    assert_eq!(found, Some(stored));
    assert!(env.storage().messages.find_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn second_insert_of_same_id_reports_already_exists() {
    let env = TestEnv::new().await.unwrap();
    let first = message("m1", "+111", "2025-01-15T10:00:00Z", Some("first"));
    let second = message("m1", "+222", "2025-01-16T10:00:00Z", Some("second"));

    env.storage().messages.insert(&first).await.unwrap();
    let err = env.storage().messages.insert(&second).await.unwrap_err();

    assert!(matches!(err, CoreError::AlreadyExists { ref message_id } if message_id == "m1"));
    let kept = env.storage().messages.find_by_id("m1").await.unwrap().unwrap();
    assert_eq!(kept.text.as_deref(), Some("first"));
    assert_eq!(env.storage().messages.count().await.unwrap(), 1);
}

#[tokio::test]
async fn list_orders_by_ts_then_message_id() {
    let env = TestEnv::new().await.unwrap();
    seed(&env, &[
        message("b", "+1", "2025-01-02T00:00:00Z", None),
        message("c", "+1", "2025-01-01T00:00:00Z", None),
        message("a", "+1", "2025-01-02T00:00:00Z", None),
    ])
    .await;

    let page = env.storage().messages.list(&MessageFilter::default(), 50, 0).await.unwrap();

    let ids: Vec<_> = page.items.iter().map(|m| m.message_id.as_str()).collect();
    assert_eq!(ids, ["c", "a", "b"]);
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn list_paginates_with_total_before_pagination() {
    let env = TestEnv::new().await.unwrap();
    let messages: Vec<_> = (0..5)
        .map(|i| message(&format!("m{i}"), "+1", &format!("2025-01-0{}T00:00:00Z", i + 1), None))
        .collect();
    seed(&env, &messages).await;

    let page = env.storage().messages.list(&MessageFilter::default(), 2, 1).await.unwrap();
    assert_eq!(page.total, 5);
    let ids: Vec<_> = page.items.iter().map(|m| m.message_id.as_str()).collect();
    assert_eq!(ids, ["m1", "m2"]);

    let past_end = env.storage().messages.list(&MessageFilter::default(), 2, 10).await.unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 5);
}

#[tokio::test]
async fn list_filters_are_conjunctive() {
    let env = TestEnv::new().await.unwrap();
    seed(&env, &[
        message("m1", "+111", "2025-01-01T00:00:00Z", Some("hello world")),
        message("m2", "+111", "2025-01-03T00:00:00Z", Some("Hello again")),
        message("m3", "+222", "2025-01-03T00:00:00Z", Some("hello there")),
        message("m4", "+111", "2025-01-04T00:00:00Z", None),
    ])
    .await;

    let by_sender = MessageFilter { from: Some("+111".into()), ..MessageFilter::default() };
    let page = env.storage().messages.list(&by_sender, 50, 0).await.unwrap();
    assert_eq!(page.total, 3);

    let since = MessageFilter { since: Some("2025-01-03T00:00:00Z".into()), ..by_sender.clone() };
    let page = env.storage().messages.list(&since, 50, 0).await.unwrap();
    let ids: Vec<_> = page.items.iter().map(|m| m.message_id.as_str()).collect();
    assert_eq!(ids, ["m2", "m4"]);

    let text = MessageFilter { text_contains: Some("hello".into()), ..MessageFilter::default() };
    let page = env.storage().messages.list(&text, 50, 0).await.unwrap();
    let ids: Vec<_> = page.items.iter().map(|m| m.message_id.as_str()).collect();
    assert_eq!(ids, ["m1", "m3"], "substring match is case-sensitive and skips null text");

    let all = MessageFilter { text_contains: Some("hello".into()), ..since };
    assert_eq!(env.storage().messages.list(&all, 50, 0).await.unwrap().total, 0);
}

#[tokio::test]
async fn text_filter_treats_like_wildcards_literally() {
    let env = TestEnv::new().await.unwrap();
    seed(&env, &[
        message("m1", "+1", "2025-01-01T00:00:00Z", Some("100% sure")),
        message("m2", "+1", "2025-01-02T00:00:00Z", Some("1000 sure")),
    ])
    .await;

    let filter = MessageFilter { text_contains: Some("0%".into()), ..MessageFilter::default() };
    let page = env.storage().messages.list(&filter, 50, 0).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].message_id, "m1");
}

#[tokio::test]
async fn empty_filter_strings_are_ignored() {
    let env = TestEnv::new().await.unwrap();
    seed(&env, &[message("m1", "+1", "2025-01-01T00:00:00Z", None)]).await;

    let filter = MessageFilter {
        from: Some(String::new()),
        since: Some(String::new()),
        text_contains: Some(String::new()),
    };
    let page = env.storage().messages.list(&filter, 50, 0).await.unwrap();

    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn list_rejects_negative_window() {
    let env = TestEnv::new().await.unwrap();

    let err = env.storage().messages.list(&MessageFilter::default(), -1, 0).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));

    let err = env.storage().messages.list(&MessageFilter::default(), 10, -5).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn stats_on_empty_store() {
    let env = TestEnv::new().await.unwrap();

    let stats = env.storage().messages.stats().await.unwrap();

    assert_eq!(stats.total_messages, 0);
    assert_eq!(stats.senders_count, 0);
    assert!(stats.top_senders.is_empty());
    assert!(stats.first_ts.is_none());
    assert!(stats.last_ts.is_none());
}

#[tokio::test]
async fn stats_aggregate_senders_and_range() {
    let env = TestEnv::new().await.unwrap();
    seed(&env, &[
        message("m1", "+222", "2025-01-03T00:00:00Z", None),
        message("m2", "+111", "2025-01-01T00:00:00Z", None),
        message("m3", "+222", "2025-01-05T00:00:00Z", None),
        message("m4", "+333", "2025-01-02T00:00:00Z", None),
        message("m5", "+111", "2025-01-04T00:00:00Z", None),
        message("m6", "+222", "2025-01-04T00:00:00Z", None),
    ])
    .await;

    let stats = env.storage().messages.stats().await.unwrap();

    assert_eq!(stats.total_messages, 6);
    assert_eq!(stats.senders_count, 3);
    assert_eq!(stats.first_ts.as_deref(), Some("2025-01-01T00:00:00Z"));
    assert_eq!(stats.last_ts.as_deref(), Some("2025-01-05T00:00:00Z"));

    let top: Vec<_> =
        stats.top_senders.iter().map(|s| (s.from_msisdn.as_str(), s.count)).collect();
    assert_eq!(top, [("+222", 3), ("+111", 2), ("+333", 1)]);
}

#[tokio::test]
async fn stats_cap_top_senders_at_ten_with_ties_by_sender() {
    let env = TestEnv::new().await.unwrap();
    let messages: Vec<_> = (0..12)
        .map(|i| message(&format!("m{i:02}"), &format!("+{i:02}"), "2025-01-01T00:00:00Z", None))
        .collect();
    seed(&env, &messages).await;

    let stats = env.storage().messages.stats().await.unwrap();

    assert_eq!(stats.senders_count, 12);
    assert_eq!(stats.top_senders.len(), 10);
    assert_eq!(stats.top_senders[0].from_msisdn, "+00");
    assert_eq!(stats.top_senders[9].from_msisdn, "+09");
}

#[tokio::test]
async fn schema_creation_is_idempotent() {
    let env = TestEnv::new().await.unwrap();
    seed(&env, &[message("m1", "+1", "2025-01-01T00:00:00Z", None)]).await;

    env.storage().ensure_schema().await.unwrap();

    assert_eq!(env.storage().messages.count().await.unwrap(), 1);
    env.storage().health_check().await.unwrap();
}

#[tokio::test]
async fn file_backed_database_survives_pool_connections() {
    let env = TestEnv::new_file_backed().await.unwrap();
    seed(&env, &[message("m1", "+1", "2025-01-01T00:00:00Z", None)]).await;

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM messages").fetch_one(&env.pool()).await.unwrap();
    assert_eq!(count, 1);
}
