//! Instagram Graph API gateway.
//!
//! Owns every HTTP call to Instagram: the first media page, cursor pages, and
//! comment creation. Responses are classified by status before their bodies
//! are read, and a 2xx body that lacks what the caller needs is an error too.

mod error;

pub use error::{ErrorKind, InstagramError};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::constants::{DEFAULT_INSTAGRAM_BASE_URL, DEFAULT_TIMEOUT_SECS, MEDIA_FIELDS, USER_AGENT};
use error::check_status;

/// One media object as returned by `/{user-id}/media`.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaItem {
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

/// One page of the media feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaPage {
    #[serde(default)]
    pub data: Vec<MediaItem>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl MediaPage {
    /// URL of the next page, if the feed continues.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|next| !next.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct CreatedComment {
    #[serde(default)]
    id: Option<String>,
}

/// The remote side of sync and relay.
///
/// [`InstagramClient`] is the production implementation.
#[async_trait]
pub trait MediaGateway: Send + Sync {
    /// Fetch one page of the account's media feed.
    ///
    /// With `cursor`, the cursor URL is requested verbatim; it already encodes
    /// the credential and field list.
    async fn fetch_media_page(
        &self,
        account_id: &str,
        cursor: Option<&str>,
    ) -> Result<MediaPage, InstagramError>;

    /// Publish a comment on a media object, returning the remote comment id.
    async fn create_comment(&self, media_id: &str, text: &str) -> Result<String, InstagramError>;
}

/// Connection settings for [`InstagramClient`].
#[derive(Clone)]
pub struct InstagramSettings {
    pub access_token: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl InstagramSettings {
    /// Settings for the public Graph API with the default timeout.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_INSTAGRAM_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for InstagramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstagramSettings")
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// reqwest-backed Graph API client.
#[derive(Clone)]
pub struct InstagramClient {
    http: Client,
    access_token: String,
    base_url: String,
}

impl InstagramClient {
    /// Build a client. The timeout applies to each request individually.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(settings: InstagramSettings) -> Result<Self, InstagramError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(InstagramError::transport)?;

        Ok(Self {
            http,
            access_token: settings.access_token,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send a request, map its status, then decode the JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, InstagramError> {
        let redacted = redact_url(url);
        debug!(url = %redacted, "Calling Instagram API");

        let response = request.send().await.map_err(InstagramError::transport)?;
        let status = response.status();
        debug!(url = %redacted, status = status.as_u16(), "Instagram API responded");

        check_status(status)?;

        let body = response.bytes().await.map_err(InstagramError::transport)?;
        serde_json::from_slice(&body)
            .map_err(|e| InstagramError::MalformedResponse(format!("undecodable body: {e}")))
    }
}

#[async_trait]
impl MediaGateway for InstagramClient {
    async fn fetch_media_page(
        &self,
        account_id: &str,
        cursor: Option<&str>,
    ) -> Result<MediaPage, InstagramError> {
        match cursor {
            Some(next) => self.send_json(self.http.get(next), next).await,
            None => {
                let url = format!("{}/{account_id}/media", self.base_url);
                let request = self.http.get(&url).query(&[
                    ("access_token", self.access_token.as_str()),
                    ("fields", MEDIA_FIELDS),
                ]);
                self.send_json(request, &url).await
            }
        }
    }

    async fn create_comment(&self, media_id: &str, text: &str) -> Result<String, InstagramError> {
        let url = format!("{}/{media_id}/comments", self.base_url);
        let request = self.http.post(&url).form(&[
            ("message", text),
            ("access_token", self.access_token.as_str()),
        ]);

        let created: CreatedComment = self.send_json(request, &url).await?;
        created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                InstagramError::MalformedResponse(
                    "comment created without an id".to_string(),
                )
            })
    }
}

/// Replace the `access_token` query value so a URL can be logged.
#[must_use]
pub fn redact_url(raw: &str) -> String {
    let Ok(mut url) = url::Url::parse(raw) else {
        return "<invalid url>".to_string();
    };

    if url.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "access_token" {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}
