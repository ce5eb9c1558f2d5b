//! Full-feed synchronization of an Instagram account into the local store.

mod lock;

pub use lock::{SyncLocks, SyncPermit};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_SYNC_MAX_PAGES, UNKNOWN_MEDIA_TYPE};
use crate::db::{upsert_post, Database, NewPost};
use crate::instagram::{InstagramError, MediaGateway, MediaItem};
use crate::timestamp::{format_instant, normalize};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] InstagramError),

    /// The feed kept advertising a next page past the configured limit.
    #[error("media feed exceeded {max_pages} pages ({processed} items applied)")]
    PageLimitExceeded { max_pages: usize, processed: usize },

    #[error("a sync for account {0} is already running")]
    AlreadyRunning(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Pages a single run may fetch before it gives up on the cursor chain.
    pub max_pages: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_SYNC_MAX_PAGES,
        }
    }
}

/// Walk the account's whole media feed and upsert every item.
///
/// Pages are fetched one at a time and each page is fully written before the
/// next request goes out. Returns the number of items processed, counting an
/// item again each time the feed repeats it. The first error aborts the run;
/// pages already written stay written.
///
/// # Errors
///
/// Returns the gateway error that stopped the walk, a store error, or
/// [`SyncError::PageLimitExceeded`] when the cursor chain runs past
/// `options.max_pages`.
pub async fn sync_account_media(
    gateway: &dyn MediaGateway,
    db: &Database,
    account_id: &str,
    options: SyncOptions,
) -> Result<usize, SyncError> {
    let mut processed = 0usize;
    let mut pages = 0usize;
    let mut cursor: Option<String> = None;

    loop {
        let page = gateway
            .fetch_media_page(account_id, cursor.as_deref())
            .await
            .inspect_err(|e| {
                warn!(
                    account_id,
                    page = pages + 1,
                    kind = ?e.kind(),
                    "Media sync aborted: {e}"
                );
            })?;
        pages += 1;

        for item in &page.data {
            upsert_post(db.pool(), &post_from_item(item)).await?;
            processed += 1;
        }

        debug!(
            account_id,
            page = pages,
            items = page.data.len(),
            processed,
            "Applied media page"
        );

        match page.next_cursor() {
            None => break,
            Some(_) if pages >= options.max_pages => {
                warn!(
                    account_id,
                    max_pages = options.max_pages,
                    processed,
                    "Media feed still has more pages, stopping"
                );
                return Err(SyncError::PageLimitExceeded {
                    max_pages: options.max_pages,
                    processed,
                });
            }
            Some(next) => cursor = Some(next.to_string()),
        }
    }

    info!(account_id, pages, processed, "Media sync complete");
    Ok(processed)
}

/// Run [`sync_account_media`] unless another run already holds the account.
///
/// # Errors
///
/// Returns [`SyncError::AlreadyRunning`] when the account is busy, otherwise
/// whatever the sync itself returns.
pub async fn sync_account_exclusive(
    locks: &SyncLocks,
    gateway: &dyn MediaGateway,
    db: &Database,
    account_id: &str,
    options: SyncOptions,
) -> Result<usize, SyncError> {
    let Some(_permit) = locks.try_acquire(account_id) else {
        info!(account_id, "Sync requested while another is running");
        return Err(SyncError::AlreadyRunning(account_id.to_string()));
    };

    sync_account_media(gateway, db, account_id, options).await
}

/// Map a feed item onto post attributes, filling the defaults for absent fields.
fn post_from_item(item: &MediaItem) -> NewPost {
    let instagram_timestamp = normalize(item.timestamp.as_deref());
    if instagram_timestamp.is_none() {
        if let Some(raw) = item.timestamp.as_deref().filter(|s| !s.trim().is_empty()) {
            debug!(media_id = %item.id, raw, "Unparseable media timestamp, storing none");
        }
    }

    NewPost {
        instagram_media_id: item.id.clone(),
        caption: item.caption.clone().unwrap_or_default(),
        media_type: item
            .media_type
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_MEDIA_TYPE.to_string()),
        media_url: item.media_url.clone().unwrap_or_default(),
        permalink: item.permalink.clone().unwrap_or_default(),
        thumbnail_url: item.thumbnail_url.clone().unwrap_or_default(),
        instagram_timestamp: instagram_timestamp.map(format_instant),
    }
}
