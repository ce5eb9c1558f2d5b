use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

use super::cursor::{PostCursor, PostPage};
use super::models::{Comment, NewComment, NewPost, Post};

// ========== Posts ==========

/// Insert a post or overwrite the existing row with the same media id,
/// returning the local post id.
///
/// A single statement, so concurrent writers never produce a duplicate row.
pub async fn upsert_post(pool: &SqlitePool, post: &NewPost) -> Result<i64> {
    let row = sqlx::query(
        r"
        INSERT INTO posts (
            instagram_media_id, caption, media_type, media_url,
            permalink, thumbnail_url, instagram_timestamp
        )
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(instagram_media_id) DO UPDATE SET
            caption = excluded.caption,
            media_type = excluded.media_type,
            media_url = excluded.media_url,
            permalink = excluded.permalink,
            thumbnail_url = excluded.thumbnail_url,
            instagram_timestamp = excluded.instagram_timestamp,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        RETURNING id
        ",
    )
    .bind(&post.instagram_media_id)
    .bind(&post.caption)
    .bind(&post.media_type)
    .bind(&post.media_url)
    .bind(&post.permalink)
    .bind(&post.thumbnail_url)
    .bind(&post.instagram_timestamp)
    .fetch_one(pool)
    .await
    .context("Failed to upsert post")?;

    Ok(row.get::<i64, _>("id"))
}

/// Get a post by local id.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")
}

/// Get a post by its Instagram media id.
pub async fn get_post_by_media_id(pool: &SqlitePool, media_id: &str) -> Result<Option<Post>> {
    sqlx::query_as("SELECT * FROM posts WHERE instagram_media_id = ?")
        .bind(media_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post by media id")
}

/// Count all posts.
pub async fn count_posts(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;
    Ok(row.0)
}

/// Fetch the page of posts that follows `after` (or the first page).
///
/// Order is `instagram_timestamp DESC, id DESC`. SQLite sorts NULL lowest,
/// so undated posts come last.
pub async fn list_posts_page(
    pool: &SqlitePool,
    after: Option<&PostCursor>,
    limit: i64,
) -> Result<PostPage> {
    // One extra row tells us whether another page exists.
    let fetch = limit + 1;

    let mut posts: Vec<Post> = match after {
        None => {
            sqlx::query_as(
                "SELECT * FROM posts ORDER BY instagram_timestamp DESC, id DESC LIMIT ?",
            )
            .bind(fetch)
            .fetch_all(pool)
            .await
        }
        Some(PostCursor {
            timestamp: Some(ts),
            id,
        }) => {
            sqlx::query_as(
                r"
                SELECT * FROM posts
                WHERE instagram_timestamp < ?
                   OR (instagram_timestamp = ? AND id < ?)
                   OR instagram_timestamp IS NULL
                ORDER BY instagram_timestamp DESC, id DESC
                LIMIT ?
                ",
            )
            .bind(ts)
            .bind(ts)
            .bind(*id)
            .bind(fetch)
            .fetch_all(pool)
            .await
        }
        Some(PostCursor {
            timestamp: None,
            id,
        }) => {
            sqlx::query_as(
                r"
                SELECT * FROM posts
                WHERE instagram_timestamp IS NULL AND id < ?
                ORDER BY id DESC
                LIMIT ?
                ",
            )
            .bind(*id)
            .bind(fetch)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list posts")?;

    let has_more = posts.len() as i64 > limit;
    posts.truncate(usize::try_from(limit).unwrap_or(0));
    let next = if has_more {
        posts.last().map(PostCursor::after)
    } else {
        None
    };

    Ok(PostPage { posts, next })
}

// ========== Comments ==========

/// Insert a confirmed comment and return the stored row.
pub async fn insert_comment(pool: &SqlitePool, comment: &NewComment) -> Result<Comment> {
    sqlx::query_as(
        r"
        INSERT INTO comments (post_id, instagram_comment_id, text)
        VALUES (?, ?, ?)
        RETURNING *
        ",
    )
    .bind(comment.post_id)
    .bind(&comment.instagram_comment_id)
    .bind(&comment.text)
    .fetch_one(pool)
    .await
    .context("Failed to insert comment")
}

/// Get a comment by local id.
pub async fn get_comment(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    sqlx::query_as("SELECT * FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch comment")
}

/// All comments on a post, oldest first.
pub async fn get_comments_for_post(pool: &SqlitePool, post_id: i64) -> Result<Vec<Comment>> {
    sqlx::query_as("SELECT * FROM comments WHERE post_id = ? ORDER BY id ASC")
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to fetch comments for post")
}

/// Count all comments.
pub async fn count_comments(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments")
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;
    Ok(row.0)
}

// ========== Health ==========

/// Round-trip a trivial query to prove the database is reachable.
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("Database ping failed")?;
    Ok(())
}
