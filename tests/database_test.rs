//! Integration tests for database operations.

use instagram_sync::db::{
    count_comments, count_posts, get_comment, get_post, get_post_by_media_id, insert_comment,
    list_posts_page, ping, upsert_post, Database, NewComment, NewPost, PostCursor,
};
use tempfile::TempDir;

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

fn new_post(media_id: &str, timestamp: Option<&str>) -> NewPost {
    NewPost {
        instagram_media_id: media_id.to_string(),
        caption: format!("caption {media_id}"),
        media_type: "IMAGE".to_string(),
        media_url: String::new(),
        permalink: String::new(),
        thumbnail_url: String::new(),
        instagram_timestamp: timestamp.map(ToString::to_string),
    }
}

#[tokio::test]
async fn test_upsert_and_get_post() {
    let (db, _temp_dir) = setup_db().await;

    let post_id = upsert_post(db.pool(), &new_post("ig_1", Some("2024-01-01T00:00:00.000000Z")))
        .await
        .expect("Failed to upsert post");
    assert!(post_id > 0);

    let retrieved = get_post(db.pool(), post_id)
        .await
        .expect("Failed to get post")
        .expect("Post not found");

    assert_eq!(retrieved.instagram_media_id, "ig_1");
    assert_eq!(retrieved.caption, "caption ig_1");
    assert_eq!(
        retrieved.instagram_timestamp.as_deref(),
        Some("2024-01-01T00:00:00.000000Z")
    );
    assert!(retrieved.created_at.ends_with('Z'));
    assert!(retrieved.created_at.contains('T'));
}

#[tokio::test]
async fn test_upsert_keeps_one_row_per_media_id() {
    let (db, _temp_dir) = setup_db().await;

    let first = upsert_post(db.pool(), &new_post("ig_1", None)).await.unwrap();
    let mut changed = new_post("ig_1", Some("2024-02-02T00:00:00.000000Z"));
    changed.caption = "edited".to_string();
    let second = upsert_post(db.pool(), &changed).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(count_posts(db.pool()).await.unwrap(), 1);

    let post = get_post_by_media_id(db.pool(), "ig_1").await.unwrap().unwrap();
    assert_eq!(post.caption, "edited");
    assert_eq!(
        post.instagram_timestamp.as_deref(),
        Some("2024-02-02T00:00:00.000000Z")
    );
}

#[tokio::test]
async fn test_comment_insert_and_cascade() {
    let (db, _temp_dir) = setup_db().await;
    let post_id = upsert_post(db.pool(), &new_post("ig_1", None)).await.unwrap();

    let comment = insert_comment(
        db.pool(),
        &NewComment {
            post_id,
            instagram_comment_id: "rc_1".to_string(),
            text: "hello".to_string(),
        },
    )
    .await
    .expect("Failed to insert comment");

    let fetched = get_comment(db.pool(), comment.id).await.unwrap().unwrap();
    assert_eq!(fetched.post_id, post_id);
    assert_eq!(fetched.instagram_comment_id, "rc_1");

    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(post_id)
        .execute(db.pool())
        .await
        .unwrap();

    assert_eq!(count_comments(db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_comment_requires_existing_post() {
    let (db, _temp_dir) = setup_db().await;

    let result = insert_comment(
        db.pool(),
        &NewComment {
            post_id: 12345,
            instagram_comment_id: "rc_1".to_string(),
            text: "orphan".to_string(),
        },
    )
    .await;

    assert!(result.is_err());
    assert_eq!(count_comments(db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_list_posts_order_and_pages() {
    let (db, _temp_dir) = setup_db().await;

    // Five dated posts inserted oldest first, plus two undated.
    for day in 1..=5 {
        let ts = format!("2024-01-0{day}T00:00:00.000000Z");
        upsert_post(db.pool(), &new_post(&format!("dated_{day}"), Some(&ts)))
            .await
            .unwrap();
    }
    upsert_post(db.pool(), &new_post("undated_a", None)).await.unwrap();
    upsert_post(db.pool(), &new_post("undated_b", None)).await.unwrap();

    let mut seen = Vec::new();
    let mut cursor: Option<PostCursor> = None;
    let mut pages = 0;
    loop {
        let page = list_posts_page(db.pool(), cursor.as_ref(), 3).await.unwrap();
        pages += 1;
        assert!(page.posts.len() <= 3);
        seen.extend(page.posts.iter().map(|p| p.instagram_media_id.clone()));
        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(
        seen,
        vec![
            "dated_5",
            "dated_4",
            "dated_3",
            "dated_2",
            "dated_1",
            "undated_b",
            "undated_a"
        ]
    );
}

#[tokio::test]
async fn test_list_posts_ties_break_on_id() {
    let (db, _temp_dir) = setup_db().await;
    let ts = Some("2024-01-01T00:00:00.000000Z");
    let first = upsert_post(db.pool(), &new_post("a", ts)).await.unwrap();
    let second = upsert_post(db.pool(), &new_post("b", ts)).await.unwrap();

    let page = list_posts_page(db.pool(), None, 1).await.unwrap();
    assert_eq!(page.posts[0].id, second);

    let next = page.next.expect("second page expected");
    let page = list_posts_page(db.pool(), Some(&next), 1).await.unwrap();
    assert_eq!(page.posts[0].id, first);
    assert!(page.next.is_none());
}

#[tokio::test]
async fn test_exact_page_has_no_next() {
    let (db, _temp_dir) = setup_db().await;
    for i in 0..3 {
        upsert_post(db.pool(), &new_post(&format!("p{i}"), None)).await.unwrap();
    }

    let page = list_posts_page(db.pool(), None, 3).await.unwrap();
    assert_eq!(page.posts.len(), 3);
    assert!(page.next.is_none());
}

#[tokio::test]
async fn test_reopen_runs_migrations_once() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.sqlite");

    {
        let db = Database::new(&db_path).await.unwrap();
        upsert_post(db.pool(), &new_post("ig_1", None)).await.unwrap();
        db.pool().close().await;
    }

    let db = Database::new(&db_path).await.unwrap();
    ping(db.pool()).await.unwrap();
    assert_eq!(count_posts(db.pool()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_store_uses_wal_and_foreign_keys() {
    let (db, _temp_dir) = setup_db().await;

    let (journal_mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
        .fetch_one(db.pool())
        .await
        .unwrap();
    let (foreign_keys,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
        .fetch_one(db.pool())
        .await
        .unwrap();

    assert_eq!(journal_mode.to_lowercase(), "wal");
    assert_eq!(foreign_keys, 1);
}

#[tokio::test]
async fn test_reopen_leaves_store_writable() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.sqlite");

    Database::new(&db_path).await.unwrap().pool().close().await;
    let db = Database::new(&db_path).await.unwrap();

    // The write lock taken while opening must not outlive `new`.
    upsert_post(db.pool(), &new_post("ig_1", None)).await.unwrap();
    assert_eq!(count_posts(db.pool()).await.unwrap(), 1);
}
