//! Route handlers for the arbitrage HTTP surface.
//!
//! `/arbitrage` always answers 200; partial cycles carry their fetch
//! errors in the body. Manual execution is the only surface that maps
//! engine errors onto HTTP status codes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hourly_edge_engine::{
    ArbitrageEngine, AutoTradeToggle, CycleReport, EngineError, ExecuteRequest, TradeRecord,
    TradingStatus, DEFAULT_CONTRACTS, MAX_CONTRACTS,
};

/// Structured error body for non-200 responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            reason: None,
        }
    }

    fn with_reason(error: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            reason: Some(reason.into()),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn engine_error_response(err: EngineError) -> ApiError {
    let status = match &err {
        EngineError::TransitionBlocked { .. } | EngineError::MissingReferenceStrike(_) => {
            StatusCode::CONFLICT
        }
        EngineError::UnknownStrike(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        EngineError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = match err {
        EngineError::TransitionBlocked { reason } => {
            ErrorResponse::with_reason("transition_blocked", reason)
        }
        other => ErrorResponse::new(other.to_string()),
    };

    (status, Json(body))
}

#[derive(Debug, Deserialize)]
pub struct ArbitrageQuery {
    pub contracts: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AutoTradeQuery {
    pub enabled: bool,
}

/// Manual execute body plus the optional override flag.
#[derive(Debug, Deserialize)]
pub struct ExecutePayload {
    #[serde(flatten)]
    pub request: ExecuteRequest,
    #[serde(default)]
    pub force: bool,
}

/// Runs one full arbitrage cycle.
///
/// # Errors
/// Returns `400` when `contracts` is outside `1..=10000`.
pub async fn get_arbitrage(
    State(engine): State<Arc<ArbitrageEngine>>,
    Query(query): Query<ArbitrageQuery>,
) -> Result<Json<CycleReport>, ApiError> {
    let contracts = query.contracts.unwrap_or(DEFAULT_CONTRACTS);
    if contracts == 0 || contracts > MAX_CONTRACTS {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "contracts must be between 1 and {MAX_CONTRACTS}"
            ))),
        ));
    }

    Ok(Json(engine.run_cycle(contracts).await))
}

/// Returns the trading surface status with the last 10 trades.
pub async fn get_trading_status(
    State(engine): State<Arc<ArbitrageEngine>>,
) -> Json<TradingStatus> {
    Json(engine.trading_status().await)
}

/// Toggles auto-trade. Enabling with a not-ready executor returns
/// warnings but still enables.
pub async fn post_auto_trade(
    State(engine): State<Arc<ArbitrageEngine>>,
    Query(query): Query<AutoTradeQuery>,
) -> Json<AutoTradeToggle> {
    Json(engine.set_auto_trade(query.enabled).await)
}

/// Executes a manually specified pairing.
///
/// # Errors
/// Returns `409` with a structured reason when the cycle is blocked
/// and `force` is not set, `404` for an unknown strike, `400` for an
/// invalid request, and `500` when both legs fail at dispatch.
pub async fn post_execute(
    State(engine): State<Arc<ArbitrageEngine>>,
    Json(payload): Json<ExecutePayload>,
) -> Result<Json<TradeRecord>, ApiError> {
    engine
        .execute_manual(payload.request, payload.force)
        .await
        .map(Json)
        .map_err(engine_error_response)
}
