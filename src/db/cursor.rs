//! Opaque keyset cursors for the post listing.
//!
//! Posts are listed by `(instagram_timestamp DESC, id DESC)`, with undated
//! posts last. A cursor records the sort key of the last post a client has
//! seen; clients only ever handle the encoded token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::Post;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor is not valid base64")]
    Encoding,
    #[error("cursor payload is invalid")]
    Payload,
}

/// Sort key of the last post on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCursor {
    #[serde(rename = "ts")]
    pub timestamp: Option<String>,
    pub id: i64,
}

impl PostCursor {
    /// Cursor positioned just after `post`.
    #[must_use]
    pub fn after(post: &Post) -> Self {
        Self {
            timestamp: post.instagram_timestamp.clone(),
            id: post.id,
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let payload = serde_json::json!({ "ts": self.timestamp, "id": self.id });
        URL_SAFE_NO_PAD.encode(payload.to_string())
    }

    /// Decode a token produced by [`PostCursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the token was not produced by `encode`.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CursorError::Encoding)?;
        serde_json::from_slice(&bytes).map_err(|_| CursorError::Payload)
    }
}

/// One page of the post listing.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    /// Present when more posts follow this page.
    pub next: Option<PostCursor>,
}
