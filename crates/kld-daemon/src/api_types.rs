//! Request and response types for the kld-daemon HTTP endpoints.
//!
//! Query structs are strongly typed with explicit optional fields; they are
//! decoded once at the HTTP boundary and validated in `kld-feed`. No
//! business logic lives here.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /api/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// /api/history
// ---------------------------------------------------------------------------

/// Query parameters for history retrieval. `from`/`to` are epoch
/// milliseconds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub symbol: Option<String>,
    pub period: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

// ---------------------------------------------------------------------------
// /api/symbols
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolsParams {
    pub q: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors and acks
// ---------------------------------------------------------------------------

/// Uniform error body: `code` mirrors the HTTP status so browser-side code
/// can branch without reading response metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
}

/// Acknowledgement for the no-op subscribe/unsubscribe routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}
