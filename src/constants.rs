//! Shared constants used across the application.

/// Graph API root used when `INSTAGRAM_BASE_URL` is not set.
pub const DEFAULT_INSTAGRAM_BASE_URL: &str = "https://graph.facebook.com/v19.0";

/// Fields requested for every media item on the first page of the feed.
///
/// Cursor URLs returned by the API already carry this list.
pub const MEDIA_FIELDS: &str = "id,caption,media_type,media_url,permalink,thumbnail_url,timestamp";

/// Per-request timeout for Graph API calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Upper bound on pages walked by a single sync run.
pub const DEFAULT_SYNC_MAX_PAGES: usize = 1000;

/// Maximum comment length accepted by the API layer, in characters.
pub const DEFAULT_COMMENT_MAX_CHARS: usize = 1000;

/// Page size of the local post listing.
pub const POSTS_PAGE_SIZE: i64 = 10;

/// Stored when the remote payload has no media type.
pub const UNKNOWN_MEDIA_TYPE: &str = "UNKNOWN";

/// User agent sent with Graph API requests.
pub const USER_AGENT: &str = concat!("instagram-sync/", env!("CARGO_PKG_VERSION"));
