//! Order execution against the CLOB.
//!
//! Implements the venue-neutral `OrderExecutor` trait. Paper mode
//! simulates fills locally; live mode submits L2-signed orders to the
//! CLOB order endpoint.

use crate::auth::{ApiCredentials, L2Auth};
use crate::clob::CLOB_API_URL;
use async_trait::async_trait;
use hourly_edge_core::{ExecutionError, OrderExecutor, OrderReceipt, OrderSide, OrderTicket, Venue};
use rust_decimal::Decimal;
use uuid::Uuid;

// =============================================================================
// Executor
// =============================================================================

/// Order executor for the Polymarket CLOB.
pub struct PolymarketExecutor {
    http: reqwest::Client,
    base_url: String,
    auth: Option<L2Auth>,
    paper: bool,
}

impl std::fmt::Debug for PolymarketExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolymarketExecutor")
            .field("base_url", &self.base_url)
            .field("paper", &self.paper)
            .finish_non_exhaustive()
    }
}

impl PolymarketExecutor {
    /// Creates a paper-trading executor. Orders are logged and filled
    /// locally without touching the venue.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn paper() -> Result<Self, ExecutionError> {
        Ok(Self {
            http: Self::build_http()?,
            base_url: CLOB_API_URL.to_string(),
            auth: None,
            paper: true,
        })
    }

    /// Creates a live executor with L2 credentials.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn live(creds: ApiCredentials) -> Result<Self, ExecutionError> {
        Ok(Self {
            http: Self::build_http()?,
            base_url: CLOB_API_URL.to_string(),
            auth: Some(L2Auth::new(creds)),
            paper: false,
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_http() -> Result<reqwest::Client, ExecutionError> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ExecutionError::Network(format!("failed to build HTTP client: {e}")))
    }

    /// Rejects tickets this venue cannot express.
    ///
    /// The hourly market trades Up and Down tokens. Yes/No sides belong
    /// to the discrete-strike venue and indicate a routing bug upstream.
    fn validate_ticket(ticket: &OrderTicket) -> Result<(), ExecutionError> {
        match ticket.side {
            OrderSide::Up | OrderSide::Down => {}
            OrderSide::Yes | OrderSide::No => {
                return Err(ExecutionError::InvalidOrder(format!(
                    "side {:?} is not tradeable on polymarket",
                    ticket.side
                )));
            }
        }

        if ticket.quantity == 0 {
            return Err(ExecutionError::InvalidOrder(
                "quantity must be positive".to_string(),
            ));
        }

        if ticket.limit_price <= Decimal::ZERO || ticket.limit_price >= Decimal::ONE {
            return Err(ExecutionError::InvalidOrder(format!(
                "limit price {} outside (0, 1)",
                ticket.limit_price
            )));
        }

        if ticket.market_id.is_empty() {
            return Err(ExecutionError::InvalidOrder(
                "market id cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    fn paper_fill(&self, ticket: &OrderTicket) -> OrderReceipt {
        let receipt = OrderReceipt {
            order_id: format!("paper-{}", Uuid::new_v4()),
            venue: Venue::Polymarket,
            paper: true,
            placed_at: chrono::Utc::now(),
        };

        tracing::info!(
            market_id = %ticket.market_id,
            side = ?ticket.side,
            quantity = ticket.quantity,
            limit_price = %ticket.limit_price,
            order_id = %receipt.order_id,
            "paper order filled"
        );

        receipt
    }

    async fn submit_live(&self, ticket: &OrderTicket) -> Result<OrderReceipt, ExecutionError> {
        let auth = self.auth.as_ref().ok_or_else(|| {
            ExecutionError::NotReady {
                venue: Venue::Polymarket,
                reason: "no API credentials configured".to_string(),
            }
        })?;

        let body = serde_json::json!({
            "tokenID": ticket.market_id,
            "side": "BUY",
            "size": ticket.quantity.to_string(),
            "price": ticket.limit_price.to_string(),
            "orderType": "FOK",
        })
        .to_string();

        let headers = auth
            .headers("POST", "/order", &body)
            .map_err(|e| ExecutionError::Auth(e.to_string()))?;

        let url = format!("{}/order", self.base_url);
        tracing::debug!("POST {}", url);

        let mut request = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .body(body);
        for (name, value) in headers.as_tuples() {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExecutionError::Network(e.to_string()))?;
        let status = response.status();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            let text = response.text().await.unwrap_or_default();
            return Err(ExecutionError::Auth(format!("HTTP {status}: {text}")));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ExecutionError::Rejected(format!("HTTP {status}: {text}")));
        }

        let raw: RawOrderResponse = response
            .json()
            .await
            .map_err(|e| ExecutionError::Network(format!("bad order response: {e}")))?;

        if !raw.success {
            return Err(ExecutionError::Rejected(
                raw.error_msg.unwrap_or_else(|| "order not accepted".to_string()),
            ));
        }

        let order_id = raw
            .order_id
            .ok_or_else(|| ExecutionError::Rejected("order accepted without an id".to_string()))?;

        tracing::info!(
            market_id = %ticket.market_id,
            order_id = %order_id,
            "order submitted"
        );

        Ok(OrderReceipt {
            order_id,
            venue: Venue::Polymarket,
            paper: false,
            placed_at: chrono::Utc::now(),
        })
    }
}

/// Raw order response from the CLOB.
#[derive(Debug, serde::Deserialize)]
struct RawOrderResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "orderID")]
    order_id: Option<String>,
    #[serde(rename = "errorMsg")]
    error_msg: Option<String>,
}

#[async_trait]
impl OrderExecutor for PolymarketExecutor {
    fn venue(&self) -> Venue {
        Venue::Polymarket
    }

    fn is_paper(&self) -> bool {
        self.paper
    }

    async fn is_ready(&self) -> bool {
        self.paper || self.auth.is_some()
    }

    async fn place_order(&self, ticket: &OrderTicket) -> Result<OrderReceipt, ExecutionError> {
        Self::validate_ticket(ticket)?;

        if self.paper {
            return Ok(self.paper_fill(ticket));
        }

        self.submit_live(ticket).await
    }
}
