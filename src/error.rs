// Fetch error taxonomy: every way a tracking request can fail, classified once.

use std::fmt;

/// Failure class of a single tracking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// HTTP 404.
    NotFound,
    /// HTTP 429.
    RateLimited,
    /// Any other 4xx, or an empty id rejected before any request.
    ClientError,
    /// HTTP 5xx, or any other non-success status.
    ServerError,
    /// A success response whose body is not a JSON object.
    Unparseable,
    /// Transport failure, timeout, or a request that could not be built.
    Network,
}

impl FetchErrorKind {
    /// Classify a non-success HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            429 => Self::RateLimited,
            400..=499 => Self::ClientError,
            _ => Self::ServerError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
            Self::Unparseable => "unparseable",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Build from a non-success response. `detail` is the body's error field,
    /// if the body had one.
    pub fn from_response(status: u16, detail: Option<String>) -> Self {
        let message = match detail {
            Some(detail) if !detail.trim().is_empty() => detail,
            _ => format!("Error {}: unknown error", status),
        };
        Self {
            kind: FetchErrorKind::from_status(status),
            message,
            status: Some(status),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    pub fn unparseable(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Unparseable, message)
    }

    /// Rejected before any request was made.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::ClientError, message)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("request timed out: {}", err))
        } else if err.is_builder() {
            Self::network(format!("request could not be built: {}", err))
        } else {
            Self::network(format!("transport failure: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        assert_eq!(FetchErrorKind::from_status(404), FetchErrorKind::NotFound);
        assert_eq!(FetchErrorKind::from_status(429), FetchErrorKind::RateLimited);
        assert_eq!(FetchErrorKind::from_status(400), FetchErrorKind::ClientError);
        assert_eq!(FetchErrorKind::from_status(418), FetchErrorKind::ClientError);
        assert_eq!(FetchErrorKind::from_status(500), FetchErrorKind::ServerError);
        assert_eq!(FetchErrorKind::from_status(503), FetchErrorKind::ServerError);
        assert_eq!(FetchErrorKind::from_status(304), FetchErrorKind::ServerError);
    }

    #[test]
    fn test_message_prefers_detail() {
        let err = FetchError::from_response(404, Some("not found".into()));
        assert_eq!(err.kind, FetchErrorKind::NotFound);
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status, Some(404));

        let err = FetchError::from_response(502, None);
        assert_eq!(err.kind, FetchErrorKind::ServerError);
        assert!(err.message.contains("502"));

        let err = FetchError::from_response(429, Some("   ".into()));
        assert!(err.message.contains("429"));
    }

    #[test]
    fn test_unbuildable_request_maps_to_network() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:8000/api/v1/track/ABC123")
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(err.is_builder());
        let err = FetchError::from(err);
        assert_eq!(err.kind, FetchErrorKind::Network);
        assert_eq!(err.status, None);
    }
}
