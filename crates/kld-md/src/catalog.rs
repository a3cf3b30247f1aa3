//! Symbol-catalog collaborator boundary.
//!
//! Defines the tradable-instrument descriptor, the catalog source trait, and
//! the Sina-backed implementation. Query matching is *not* done here — the
//! catalog service in `kld-feed` always pulls the full list and filters
//! locally so matching semantics stay independent of upstream capability.

use serde::{Deserialize, Serialize};

use crate::ClientError;

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// One tradable instrument as surfaced by `/api/symbols`.
///
/// `ticker` is the unique identifier within a market. Field names on the wire
/// are camelCase to match what the charting widget expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolDescriptor {
    pub ticker: String,
    pub name: String,
    pub short_name: String,
    pub exchange: String,
    pub market: String,
    pub price_currency: String,
    #[serde(rename = "type")]
    pub kind: String,
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Upstream catalog contract: the complete instrument list, or failure.
///
/// Ordering must be stable across calls within a cache-TTL window; the Sina
/// list endpoint is asked to sort by symbol for exactly that reason.
#[async_trait::async_trait]
pub trait SymbolCatalogSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_all(&self) -> Result<Vec<SymbolDescriptor>, ClientError>;
}

// ---------------------------------------------------------------------------
// Sina implementation
// ---------------------------------------------------------------------------

/// Sina futures instrument list, mapped into [`SymbolDescriptor`]s.
///
/// The list endpoint only carries ticker and name; exchange / market /
/// currency / type are filled with the futures-market defaults the reference
/// front end assumes.
#[derive(Debug, Clone)]
pub struct SinaSymbolCatalog {
    http: reqwest::Client,
    base_url: String,
}

const SINA_LIST_BASE_URL: &str = "https://vip.stock.finance.sina.com.cn";

#[derive(Debug, Deserialize)]
struct SinaListRow {
    symbol: String,
    name: String,
}

impl SinaSymbolCatalog {
    pub fn new() -> Self {
        Self::new_with_base_url(SINA_LIST_BASE_URL.to_string())
    }

    /// Test seam: point the source at an httpmock server.
    pub fn new_with_base_url(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn list_url(&self) -> String {
        format!(
            "{}/quotes_service/api/json_v2.php/Market_Center.getHQFuturesData",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl Default for SinaSymbolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SymbolCatalogSource for SinaSymbolCatalog {
    fn source_name(&self) -> &'static str {
        "sina"
    }

    async fn fetch_all(&self) -> Result<Vec<SymbolDescriptor>, ClientError> {
        let resp = self
            .http
            .get(self.list_url())
            .query(&[("sort", "symbol")])
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                code: Some(status.as_u16()),
                message: "instrument list request failed".to_string(),
            });
        }

        let rows: Vec<SinaListRow> = resp
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        let symbols = rows
            .into_iter()
            .map(|row| SymbolDescriptor {
                short_name: row.symbol.clone(),
                ticker: row.symbol,
                name: row.name,
                exchange: "SHFE".to_string(),
                market: "futures".to_string(),
                price_currency: "CNY".to_string(),
                kind: "future".to_string(),
            })
            .collect();

        Ok(symbols)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn descriptor_serializes_camel_case() {
        let d = SymbolDescriptor {
            ticker: "rb2505".to_string(),
            name: "Rebar 2505".to_string(),
            short_name: "rb2505".to_string(),
            exchange: "SHFE".to_string(),
            market: "futures".to_string(),
            price_currency: "CNY".to_string(),
            kind: "future".to_string(),
        };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["ticker"], "rb2505");
        assert_eq!(v["shortName"], "rb2505");
        assert_eq!(v["priceCurrency"], "CNY");
        assert_eq!(v["type"], "future");
    }

    #[tokio::test]
    async fn fetch_all_maps_rows_with_futures_defaults() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/quotes_service/api/json_v2.php/Market_Center.getHQFuturesData")
                .query_param("sort", "symbol");
            then.status(200).json_body(serde_json::json!([
                {"symbol": "au2506", "name": "Gold 2506"},
                {"symbol": "rb2505", "name": "Rebar 2505"}
            ]));
        });

        let source = SinaSymbolCatalog::new_with_base_url(server.base_url());
        let symbols = source.fetch_all().await.unwrap();

        mock.assert();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].ticker, "au2506");
        assert_eq!(symbols[0].short_name, "au2506");
        assert_eq!(symbols[0].exchange, "SHFE");
        assert_eq!(symbols[1].name, "Rebar 2505");
    }

    #[tokio::test]
    async fn fetch_all_propagates_http_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/quotes_service/api/json_v2.php/Market_Center.getHQFuturesData");
            then.status(500);
        });

        let source = SinaSymbolCatalog::new_with_base_url(server.base_url());
        let err = source.fetch_all().await.unwrap_err();

        assert!(matches!(err, ClientError::Api { code: Some(500), .. }));
    }
}
