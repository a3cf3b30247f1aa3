//! Error taxonomy for the datafeed request path.
//!
//! Client-input faults (400) are distinguished from collaborator faults
//! (502 / 500) so the HTTP surface can map them without inspecting message
//! text. Nothing here is fatal to the process: every condition is
//! per-request and leaves the cache and subsequent requests unaffected.

use std::fmt;

use kld_md::ClientError;

// ---------------------------------------------------------------------------
// FeedError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// A required request parameter was absent or empty. Never retried,
    /// never reaches the collaborator.
    MissingParameter(&'static str),
    /// The requested period is not in the closed enumeration.
    UnsupportedPeriod { given: String },
    /// The collaborator could not be reached (transport failure or
    /// non-response). Safe for the caller to retry with backoff; never
    /// cached.
    UpstreamUnavailable(String),
    /// The collaborator answered, but the payload was an application-level
    /// error or undecodable. Never cached.
    UpstreamDataError(String),
}

impl FeedError {
    /// HTTP status this condition maps to at the API surface.
    pub fn http_status(&self) -> u16 {
        match self {
            FeedError::MissingParameter(_) => 400,
            FeedError::UnsupportedPeriod { .. } => 400,
            FeedError::UpstreamUnavailable(_) => 502,
            FeedError::UpstreamDataError(_) => 500,
        }
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::MissingParameter(name) => {
                write!(f, "missing required parameter: {name}")
            }
            FeedError::UnsupportedPeriod { given } => {
                write!(
                    f,
                    "unsupported period '{given}'; supported periods: {}",
                    kld_md::Period::supported_list()
                )
            }
            FeedError::UpstreamUnavailable(msg) => {
                write!(f, "market data source unavailable: {msg}")
            }
            FeedError::UpstreamDataError(msg) => {
                write!(f, "market data source returned bad data: {msg}")
            }
        }
    }
}

impl std::error::Error for FeedError {}

impl From<ClientError> for FeedError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(msg) => FeedError::UpstreamUnavailable(msg),
            other => FeedError::UpstreamDataError(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// DataQualityWarning
// ---------------------------------------------------------------------------

/// Non-fatal notice that rows were excluded while normalizing a history
/// response. Attached alongside a successful result; never blocks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataQualityWarning {
    pub dropped_malformed: usize,
    pub dropped_duplicate_ts: usize,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dropped_malformed={}; dropped_duplicate_ts={}",
            self.dropped_malformed, self.dropped_duplicate_ts
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(FeedError::MissingParameter("symbol").http_status(), 400);
        assert_eq!(
            FeedError::UnsupportedPeriod {
                given: "3m".to_string()
            }
            .http_status(),
            400
        );
        assert_eq!(
            FeedError::UpstreamUnavailable("timeout".to_string()).http_status(),
            502
        );
        assert_eq!(
            FeedError::UpstreamDataError("bad json".to_string()).http_status(),
            500
        );
    }

    #[test]
    fn unsupported_period_message_names_allowed_set() {
        let err = FeedError::UnsupportedPeriod {
            given: "3m".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("3m"));
        assert!(msg.contains("5m, 15m, 1h, 1d"));
    }

    #[test]
    fn transport_error_maps_to_unavailable() {
        let err: FeedError = ClientError::Transport("connection refused".to_string()).into();
        assert!(matches!(err, FeedError::UpstreamUnavailable(_)));
    }

    #[test]
    fn api_and_decode_errors_map_to_data_error() {
        let api: FeedError = ClientError::Api {
            code: Some(456),
            message: "rate limited".to_string(),
        }
        .into();
        assert!(matches!(api, FeedError::UpstreamDataError(_)));

        let decode: FeedError = ClientError::Decode("eof".to_string()).into();
        assert!(matches!(decode, FeedError::UpstreamDataError(_)));
    }

    #[test]
    fn warning_display_carries_both_counts() {
        let w = DataQualityWarning {
            dropped_malformed: 3,
            dropped_duplicate_ts: 1,
        };
        assert_eq!(w.to_string(), "dropped_malformed=3; dropped_duplicate_ts=1");
    }
}
