//! kld-md
//!
//! Market-data collaborator boundary for the datafeed daemon.
//!
//! This crate owns the sampling-period enumeration, the raw and wire bar
//! types, the upstream client trait, and the concrete Sina-futures-backed
//! client. It does **not** cache (see `kld-cache`) and does not orchestrate
//! requests (see `kld-feed`).

pub mod catalog;
pub mod normalize;

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

/// Supported sampling granularities.
///
/// A closed enumeration: each admitted period must have a corresponding
/// upstream granularity code, so runtime extension is deliberately not
/// possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    M5,
    M15,
    H1,
    D1,
}

impl Period {
    /// All supported periods, in the order surfaced by error messages.
    pub const ALL: [Period; 4] = [Period::M5, Period::M15, Period::H1, Period::D1];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::M5 => "5m",
            Period::M15 => "15m",
            Period::H1 => "1h",
            Period::D1 => "1d",
        }
    }

    /// Sina kline-service granularity code.
    pub fn sina_code(&self) -> &'static str {
        match self {
            Period::M5 => "5",
            Period::M15 => "15",
            Period::H1 => "60",
            Period::D1 => "daily",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "5m" => Some(Period::M5),
            "15m" => Some(Period::M15),
            "1h" => Some(Period::H1),
            "1d" => Some(Period::D1),
            _ => None,
        }
    }

    /// Comma-separated list of supported period strings, for error messages.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Bars
// ---------------------------------------------------------------------------

/// A single OHLCV row exactly as returned by the upstream service.
///
/// Datetime and prices stay as strings at this boundary; parsing and
/// validation happen in `normalize` so malformed rows can be counted rather
/// than lost inside the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBar {
    /// Upstream datetime string (`YYYY-MM-DD HH:MM:SS` for intraday rows,
    /// `YYYY-MM-DD` for daily rows).
    pub datetime: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

/// A normalized OHLCV bar in the shape the charting front end consumes.
///
/// Immutable once produced; a sequence of bars handed to callers is strictly
/// ascending in `timestamp` with no duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar timestamp as UTC epoch milliseconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`MarketDataClient`] implementation may return.
#[derive(Debug)]
pub enum ClientError {
    /// Network or transport failure (includes upstream non-response).
    Transport(String),
    /// The upstream API answered with an application-level error.
    Api { code: Option<u16>, message: String },
    /// A response payload could not be decoded.
    Decode(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "transport error: {msg}"),
            ClientError::Api {
                code: Some(c),
                message,
            } => write!(f, "upstream api error code={c}: {message}"),
            ClientError::Api {
                code: None,
                message,
            } => write!(f, "upstream api error: {message}"),
            ClientError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// Upstream market-data contract.
///
/// Object-safe and `Send + Sync` so callers can hold an
/// `Arc<dyn MarketDataClient>` across async task boundaries.
#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Human-readable name identifying this source (e.g. `"sina"`).
    fn source_name(&self) -> &'static str;

    /// Fetch OHLCV rows for one symbol at one granularity.
    ///
    /// Rows come back in upstream order; callers are responsible for
    /// filtering, sorting and deduplication (`normalize`).
    async fn fetch_bars(&self, symbol: &str, period: Period) -> Result<Vec<RawBar>, ClientError>;
}

// ---------------------------------------------------------------------------
// Sina futures client
// ---------------------------------------------------------------------------

/// Sina-futures-backed [`MarketDataClient`].
///
/// Both kline services answer a JSON array of rows, each row an array of
/// strings `[datetime, open, high, low, close, volume]`. Daily rows carry a
/// date only.
#[derive(Debug, Clone)]
pub struct SinaFuturesClient {
    http: reqwest::Client,
    base_url: String,
}

const SINA_FUTURES_BASE_URL: &str = "https://stock2.finance.sina.com.cn";

impl SinaFuturesClient {
    pub fn new() -> Self {
        Self::new_with_base_url(SINA_FUTURES_BASE_URL.to_string())
    }

    /// Test seam: point the client at an httpmock server.
    pub fn new_with_base_url(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn kline_url(&self, period: Period) -> String {
        let base = self.base_url.trim_end_matches('/');
        match period {
            Period::D1 => {
                format!("{base}/futures/api/json.php/IndexService.getInnerFuturesDailyKLine")
            }
            _ => format!("{base}/futures/api/json.php/InnerFuturesNewService.getFewMinLine"),
        }
    }
}

impl Default for SinaFuturesClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MarketDataClient for SinaFuturesClient {
    fn source_name(&self) -> &'static str {
        "sina"
    }

    async fn fetch_bars(&self, symbol: &str, period: Period) -> Result<Vec<RawBar>, ClientError> {
        let url = self.kline_url(period);

        let mut query: Vec<(&str, &str)> = vec![("symbol", symbol)];
        if period != Period::D1 {
            query.push(("type", period.sina_code()));
        }

        let resp = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                code: Some(status.as_u16()),
                message: format!("kline request for '{symbol}' failed"),
            });
        }

        let rows: Vec<Vec<String>> = resp
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        // Short rows are padded with empty fields rather than discarded here;
        // normalize counts them as malformed so nothing vanishes untraced.
        let bars = rows
            .into_iter()
            .map(|row| RawBar {
                datetime: row.first().cloned().unwrap_or_default(),
                open: row.get(1).cloned().unwrap_or_default(),
                high: row.get(2).cloned().unwrap_or_default(),
                low: row.get(3).cloned().unwrap_or_default(),
                close: row.get(4).cloned().unwrap_or_default(),
                volume: row.get(5).cloned().unwrap_or_default(),
            })
            .collect();

        Ok(bars)
    }
}

// ---------------------------------------------------------------------------
// Tests (no live network; httpmock only)
// ---------------------------------------------------------------------------
