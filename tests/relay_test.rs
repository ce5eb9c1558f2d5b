//! Integration tests for comment relaying.

use std::time::Duration;

use instagram_sync::db::{
    count_comments, get_comments_for_post, upsert_post, Database, NewPost,
};
use instagram_sync::instagram::{ErrorKind, InstagramClient, InstagramError, InstagramSettings};
use instagram_sync::relay::{relay_comment, RelayError};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

fn client_for(server: &MockServer) -> InstagramClient {
    InstagramClient::new(InstagramSettings {
        access_token: "test-token".to_string(),
        base_url: format!("{}/v19.0", server.uri()),
        timeout: Duration::from_secs(5),
    })
    .expect("Failed to build client")
}

async fn create_post(db: &Database, media_id: &str) -> i64 {
    let new_post = NewPost {
        instagram_media_id: media_id.to_string(),
        caption: String::new(),
        media_type: "IMAGE".to_string(),
        media_url: String::new(),
        permalink: String::new(),
        thumbnail_url: String::new(),
        instagram_timestamp: None,
    };
    upsert_post(db.pool(), &new_post)
        .await
        .expect("Failed to create post")
}

#[tokio::test]
async fn test_relay_success_creates_comment() {
    let (db, _temp_dir) = setup_db().await;
    let post_id = create_post(&db, "ig_123").await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v19.0/ig_123/comments"))
        .and(body_string_contains("message=hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "rc_1"})))
        .expect(1)
        .mount(&server)
        .await;

    let comment = relay_comment(&client_for(&server), &db, post_id, "hello")
        .await
        .expect("relay failed");

    assert_eq!(comment.post_id, post_id);
    assert_eq!(comment.instagram_comment_id, "rc_1");
    assert_eq!(comment.text, "hello");
    assert_eq!(count_comments(db.pool()).await.unwrap(), 1);

    let stored = get_comments_for_post(db.pool(), post_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, comment.id);
}

#[tokio::test]
async fn test_relay_remote_not_found_writes_nothing() {
    let (db, _temp_dir) = setup_db().await;
    let post_id = create_post(&db, "ig_123").await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = relay_comment(&client_for(&server), &db, post_id, "hello")
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Remote(InstagramError::NotFound)));
    assert_eq!(count_comments(db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_relay_error_kinds_pass_through() {
    let cases = [
        (401, ErrorKind::Auth),
        (403, ErrorKind::Auth),
        (500, ErrorKind::Gateway),
    ];

    for (status, expected) in cases {
        let (db, _temp_dir) = setup_db().await;
        let post_id = create_post(&db, "ig_123").await;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let err = relay_comment(&client_for(&server), &db, post_id, "hello")
            .await
            .unwrap_err();

        match err {
            RelayError::Remote(e) => assert_eq!(e.kind(), expected, "status {status}"),
            other => panic!("unexpected error for {status}: {other:?}"),
        }
        assert_eq!(count_comments(db.pool()).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn test_relay_success_without_id_writes_nothing() {
    let (db, _temp_dir) = setup_db().await;
    let post_id = create_post(&db, "ig_123").await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let err = relay_comment(&client_for(&server), &db, post_id, "hello")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RelayError::Remote(InstagramError::MalformedResponse(_))
    ));
    assert_eq!(count_comments(db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_relay_timeout_writes_nothing() {
    let (db, _temp_dir) = setup_db().await;
    let post_id = create_post(&db, "ig_123").await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = InstagramClient::new(InstagramSettings {
        access_token: "test-token".to_string(),
        base_url: format!("{}/v19.0", server.uri()),
        timeout: Duration::from_millis(200),
    })
    .unwrap();

    let err = relay_comment(&client, &db, post_id, "hello")
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Remote(InstagramError::Transport(_))));
    assert_eq!(count_comments(db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_relay_missing_post_never_calls_instagram() {
    let (db, _temp_dir) = setup_db().await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "rc_1"})))
        .expect(0)
        .mount(&server)
        .await;

    let err = relay_comment(&client_for(&server), &db, 999, "hi")
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::PostNotFound(999)));
    assert_eq!(count_comments(db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_remote_id_is_store_error() {
    let (db, _temp_dir) = setup_db().await;
    let post_id = create_post(&db, "ig_123").await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "rc_1"})))
        .expect(2)
        .mount(&server)
        .await;
    let client = client_for(&server);

    relay_comment(&client, &db, post_id, "first").await.unwrap();
    let err = relay_comment(&client, &db, post_id, "second")
        .await
        .unwrap_err();

    // Instagram accepted it, so this must not look like a relay success.
    assert!(matches!(err, RelayError::Store(_)));
    assert_eq!(count_comments(db.pool()).await.unwrap(), 1);
}
