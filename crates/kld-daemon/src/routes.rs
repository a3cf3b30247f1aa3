//! Axum router and all HTTP handlers for kld-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{rejection::QueryRejection, FromRequestParts, Query, State},
    http::{request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use kld_feed::{FeedError, HistoryQuery};

use crate::{
    api_types::{AckResponse, ErrorBody, HealthResponse, HistoryParams, SymbolsParams},
    state::AppState,
};

/// Response header carrying the data-quality warning for a history result.
/// The body stays a plain bar array per the Datafeed wire contract.
pub const DATA_QUALITY_HEADER: &str = "x-data-quality";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/symbols", get(symbols))
        .route("/api/history", get(history))
        .route("/api/subscribe", post(subscribe))
        .route("/api/unsubscribe", post(unsubscribe))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query extraction
// ---------------------------------------------------------------------------

/// `Query` wrapper whose rejection renders the uniform `{error, code}` body.
///
/// Axum's stock extractor answers a malformed query string (e.g. a
/// non-numeric `from`) with a plain-text 400, which would be the one place
/// the API breaks its own error-body contract.
pub(crate) struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(bad_query_response(rejection)),
        }
    }
}

fn bad_query_response(rejection: QueryRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: rejection.body_text(),
            code: StatusCode::BAD_REQUEST.as_u16(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /api/symbols
// ---------------------------------------------------------------------------

/// Symbol search. Catalog failures degrade to `[]` inside the service, so
/// this route never answers 4xx/5xx for collaborator trouble.
pub(crate) async fn symbols(
    State(st): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SymbolsParams>,
) -> impl IntoResponse {
    let matches = st.catalog.search(params.q.as_deref()).await;
    (StatusCode::OK, Json(matches))
}

// ---------------------------------------------------------------------------
// GET /api/history
// ---------------------------------------------------------------------------

pub(crate) async fn history(
    State(st): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> Response {
    let query = HistoryQuery {
        symbol: params.symbol,
        period: params.period,
        from: params.from,
        to: params.to,
    };

    match st.history.fetch(&query).await {
        Ok(result) => {
            let warning = result.warning;
            let mut resp = (StatusCode::OK, Json(result.bars)).into_response();
            if let Some(w) = warning {
                if let Ok(value) = HeaderValue::from_str(&w.to_string()) {
                    resp.headers_mut().insert(DATA_QUALITY_HEADER, value);
                }
            }
            resp
        }
        Err(err) => feed_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// POST /api/subscribe  /api/unsubscribe
// ---------------------------------------------------------------------------

/// Real-time push is out of scope; the charting widget still calls these,
/// so they are acknowledged no-ops.
pub(crate) async fn subscribe() -> impl IntoResponse {
    info!("subscribe acknowledged (no-op)");
    (StatusCode::OK, Json(AckResponse { ok: true }))
}

pub(crate) async fn unsubscribe() -> impl IntoResponse {
    info!("unsubscribe acknowledged (no-op)");
    (StatusCode::OK, Json(AckResponse { ok: true }))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn feed_error_response(err: FeedError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
            code: status.as_u16(),
        }),
    )
        .into_response()
}
