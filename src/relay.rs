//! Relaying locally written comments to Instagram.
//!
//! The remote write always comes first. A comment row is inserted only once
//! Instagram has returned an id for it, so the local table never holds a
//! comment Instagram does not know about.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::db::{get_post, insert_comment, Comment, Database, NewComment};
use crate::instagram::{InstagramError, MediaGateway};

#[derive(Debug, Error)]
pub enum RelayError {
    /// No local post with this id. Instagram was not contacted.
    #[error("post {0} not found")]
    PostNotFound(i64),

    #[error(transparent)]
    Remote(#[from] InstagramError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Publish `text` on the Instagram media behind local post `post_id`, then
/// record the comment locally.
///
/// Text validation happens before this is called.
///
/// # Errors
///
/// - [`RelayError::PostNotFound`] if the post does not exist locally.
/// - [`RelayError::Remote`] if Instagram rejected or failed the call; nothing
///   is written.
/// - [`RelayError::Store`] if the lookup fails, or if the insert fails after
///   Instagram accepted the comment.
pub async fn relay_comment(
    gateway: &dyn MediaGateway,
    db: &Database,
    post_id: i64,
    text: &str,
) -> Result<Comment, RelayError> {
    let post = get_post(db.pool(), post_id)
        .await?
        .ok_or(RelayError::PostNotFound(post_id))?;

    let remote_id = gateway
        .create_comment(&post.instagram_media_id, text)
        .await
        .inspect_err(|e| {
            warn!(
                post_id,
                media_id = %post.instagram_media_id,
                kind = ?e.kind(),
                "Instagram rejected comment: {e}"
            );
        })?;

    let new_comment = NewComment {
        post_id: post.id,
        instagram_comment_id: remote_id,
        text: text.to_string(),
    };

    match insert_comment(db.pool(), &new_comment).await {
        Ok(comment) => {
            info!(
                post_id,
                comment_id = comment.id,
                instagram_comment_id = %comment.instagram_comment_id,
                "Relayed comment"
            );
            Ok(comment)
        }
        Err(e) => {
            // The comment is live on Instagram; make the orphan findable.
            error!(
                post_id,
                instagram_comment_id = %new_comment.instagram_comment_id,
                "Comment published on Instagram but not stored locally: {e:#}"
            );
            Err(RelayError::Store(e))
        }
    }
}
