use serde::{Deserialize, Serialize};

/// Local copy of an Instagram media object.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub instagram_media_id: String,
    pub caption: String,
    pub media_type: String,
    pub media_url: String,
    pub permalink: String,
    pub thumbnail_url: String,
    pub instagram_timestamp: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Attributes written by a sync. Everything except the identity key is
/// overwritten on every observation.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub instagram_media_id: String,
    pub caption: String,
    pub media_type: String,
    pub media_url: String,
    pub permalink: String,
    pub thumbnail_url: String,
    pub instagram_timestamp: Option<String>,
}

/// A comment that Instagram has accepted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    #[serde(rename = "post")]
    pub post_id: i64,
    pub instagram_comment_id: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub instagram_comment_id: String,
    pub text: String,
}
