use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Coarse outcome class of a failed Graph API call.
///
/// This is what callers branch on; the variants of [`InstagramError`] carry
/// the detail for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credential rejected (401/403).
    Auth,
    /// Remote resource absent (404).
    NotFound,
    /// Transport failure, other non-2xx status, or an unusable success body.
    Gateway,
}

/// Error returned by every Graph API operation.
#[derive(Debug, Error)]
pub enum InstagramError {
    /// Connection, DNS, TLS, timeout, or body read failure.
    #[error("Instagram request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Instagram authentication failed (HTTP {status})")]
    Auth { status: u16 },

    #[error("resource not found in Instagram")]
    NotFound,

    /// Any other non-2xx status.
    #[error("Instagram API error: {status}")]
    Status { status: u16 },

    /// 2xx response that could not be decoded or lacked a required field.
    #[error("malformed Instagram response: {0}")]
    MalformedResponse(String),
}

impl InstagramError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth { .. } => ErrorKind::Auth,
            Self::NotFound => ErrorKind::NotFound,
            Self::Transport(_) | Self::Status { .. } | Self::MalformedResponse(_) => {
                ErrorKind::Gateway
            }
        }
    }

    /// Wrap a reqwest failure, dropping the request URL so the access token
    /// in its query string cannot leak through `Display`.
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

/// Translate a response status into the error taxonomy.
///
/// Runs before the body is touched: a failing status is never parsed.
pub(crate) fn check_status(status: StatusCode) -> Result<(), InstagramError> {
    match status.as_u16() {
        401 | 403 => Err(InstagramError::Auth {
            status: status.as_u16(),
        }),
        404 => Err(InstagramError::NotFound),
        _ if status.is_success() => Ok(()),
        code => Err(InstagramError::Status { status: code }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status_success() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::CREATED).is_ok());
        assert!(check_status(StatusCode::NO_CONTENT).is_ok());
    }

    #[test]
    fn test_check_status_auth() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = check_status(status).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Auth);
        }
    }

    #[test]
    fn test_check_status_not_found() {
        let err = check_status(StatusCode::NOT_FOUND).unwrap_err();
        assert!(matches!(err, InstagramError::NotFound));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_check_status_other_failures_are_gateway() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
        ] {
            let err = check_status(status).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Gateway);
            assert!(err.to_string().contains(&status.as_u16().to_string()));
        }
    }

    #[test]
    fn test_redirect_status_is_gateway() {
        let err = check_status(StatusCode::MOVED_PERMANENTLY).unwrap_err();
        assert!(matches!(err, InstagramError::Status { status: 301 }));
    }

    #[test]
    fn test_malformed_is_gateway() {
        let err = InstagramError::MalformedResponse("missing id".to_string());
        assert_eq!(err.kind(), ErrorKind::Gateway);
    }
}
