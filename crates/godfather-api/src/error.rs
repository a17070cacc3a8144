/// Errors that can occur while talking to the game backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend answered `401 Unauthorized`.
    ///
    /// On an authenticated call this means the bearer token is no longer
    /// valid. On `/auth/login` it means the credentials were rejected.
    #[error("unauthorized{}", detail_suffix(.detail))]
    Unauthorized { detail: Option<String> },

    /// The backend answered with any other non-2xx status.
    #[error("backend returned {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },

    /// The request never got a response (connection refused, DNS, TLS...).
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// A request body could not be serialized.
    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body didn't match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The configured base URL plus the endpoint path is not a valid URL.
    #[error("invalid url {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// The backend's own error message, if it sent one.
    ///
    /// The backend reports errors as `{ "detail": "..." }`. This is the
    /// text the user should see verbatim.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { detail } | Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` for a `401` response.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_backend_detail() {
        let err = ApiError::Status {
            status: 403,
            detail: Some("Market is closed".into()),
        };
        assert_eq!(err.to_string(), "backend returned 403: Market is closed");
    }

    #[test]
    fn test_display_without_detail() {
        let err = ApiError::Unauthorized { detail: None };
        assert_eq!(err.to_string(), "unauthorized");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_detail_is_none_for_transport_level_errors() {
        let err = ApiError::InvalidUrl("nope".into());
        assert!(err.detail().is_none());
        assert!(!err.is_unauthorized());
    }
}
