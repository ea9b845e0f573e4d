use crate::handlers;
use axum::{
    routing::{get, post},
    Router,
};
use hourly_edge_engine::ArbitrageEngine;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct ApiServer {
    engine: Arc<ArbitrageEngine>,
}

impl ApiServer {
    #[must_use]
    pub const fn new(engine: Arc<ArbitrageEngine>) -> Self {
        Self { engine }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/arbitrage", get(handlers::get_arbitrage))
            .route("/trading/status", get(handlers::get_trading_status))
            .route("/trading/auto-trade", post(handlers::post_auto_trade))
            .route("/trading/execute", post(handlers::post_execute))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.engine.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use hourly_edge_binance::{BinanceClient, BinanceClientConfig};
    use hourly_edge_core::{
        ExecutionError, OrderExecutor, OrderReceipt, OrderTicket, Venue,
    };
    use hourly_edge_engine::{Dispatcher, EngineConfig, QuoteAcquirer};
    use hourly_edge_kalshi::{KalshiClient, KalshiClientConfig};
    use hourly_edge_polymarket::{ClobClient, GammaClient, ProxiedHttp};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StubExecutor {
        venue: Venue,
    }

    #[async_trait]
    impl OrderExecutor for StubExecutor {
        fn venue(&self) -> Venue {
            self.venue
        }

        fn is_paper(&self) -> bool {
            true
        }

        async fn is_ready(&self) -> bool {
            true
        }

        async fn place_order(&self, _ticket: &OrderTicket) -> Result<OrderReceipt, ExecutionError> {
            Ok(OrderReceipt {
                order_id: format!("{}-1", self.venue),
                venue: self.venue,
                paper: true,
                placed_at: Utc::now(),
            })
        }
    }

    fn router_for(base_url: &str) -> Router {
        let binance = Arc::new(
            BinanceClient::new(BinanceClientConfig::default())
                .unwrap()
                .with_base_url(base_url),
        );
        let http = Arc::new(ProxiedHttp::direct_only(10).unwrap());
        let gamma = Arc::new(GammaClient::new(http.clone()).with_base_url(base_url));
        let clob = Arc::new(ClobClient::new(http).with_base_url(base_url));
        let kalshi = Arc::new(
            KalshiClient::new(KalshiClientConfig::demo())
                .unwrap()
                .with_base_url(base_url),
        );
        let acquirer = Arc::new(QuoteAcquirer::new(binance, gamma, clob, kalshi));
        let dispatcher = Dispatcher::new(
            Arc::new(StubExecutor {
                venue: Venue::Polymarket,
            }),
            Arc::new(StubExecutor {
                venue: Venue::Kalshi,
            }),
        );
        let engine = Arc::new(ArbitrageEngine::new(
            acquirer,
            dispatcher,
            EngineConfig::default(),
        ));

        ApiServer::new(engine).router()
    }

    async fn mount_healthy_markets(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "slug": "whatever",
                    "markets": [{
                        "conditionId": "0xabc123",
                        "question": "Bitcoin Up or Down",
                        "outcomes": "[\"Up\", \"Down\"]",
                        "clobTokenIds": "[\"111\", \"222\"]"
                    }]
                }
            ])))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/ticker/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "symbol": "BTCUSDT",
                "price": "93120.00000000"
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/klines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                [1754485200000i64, "93000.00000000", "93200.0", "92800.0", "93120.0", "12.3", 1754488799999i64, "0", 100, "0", "0", "0"]
            ])))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/markets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "markets": [{
                    "ticker": "KXBTCD-25AUG0616-B93000",
                    "subtitle": "$93,000 or above",
                    "yes_ask": 45,
                    "no_ask": 56
                }]
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/book"))
            .and(query_param("token_id", "111"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "asks": [{ "price": "0.48", "size": "100" }],
                "bids": []
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/book"))
            .and(query_param("token_id", "222"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "asks": [{ "price": "0.53", "size": "80" }],
                "bids": []
            })))
            .mount(server)
            .await;
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_arbitrage_returns_200_with_report() {
        let mock = MockServer::start().await;
        mount_healthy_markets(&mock).await;
        let router = router_for(&mock.uri());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/arbitrage?contracts=100")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["checks"].is_array());
        assert!(body["verdict"]["transition_blocked"].is_boolean());
        assert_eq!(body["ladder"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_arbitrage_still_200_when_sources_down() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&mock)
            .await;
        let router = router_for(&mock.uri());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/arbitrage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(!body["errors"].as_array().unwrap().is_empty());
        assert_eq!(body["opportunities"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_arbitrage_rejects_bad_contract_count() {
        let mock = MockServer::start().await;
        let router = router_for(&mock.uri());

        for uri in ["/arbitrage?contracts=0", "/arbitrage?contracts=10001"] {
            let response = router
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_trading_status() {
        let mock = MockServer::start().await;
        let router = router_for(&mock.uri());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/trading/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["auto_trade_enabled"], serde_json::json!(false));
        assert_eq!(body["continuous_paper"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_auto_trade_toggle() {
        let mock = MockServer::start().await;
        let router = router_for(&mock.uri());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/trading/auto-trade?enabled=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["enabled"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_execute_blocked_returns_409() {
        let mock = MockServer::start().await;
        // Every source down: sync validation cannot pass, so the
        // manual execute is refused.
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&mock)
            .await;
        let router = router_for(&mock.uri());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/trading/execute")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "strike": "93000",
                            "venueLeg": "yes",
                            "venueCost": "0.45",
                            "continuousLeg": "Down",
                            "continuousCost": "0.53",
                            "quantity": 50
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"], serde_json::json!("transition_blocked"));
        assert!(body["reason"].is_string());
    }

    #[tokio::test]
    async fn test_execute_success() {
        let mock = MockServer::start().await;
        mount_healthy_markets(&mock).await;
        let router = router_for(&mock.uri());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/trading/execute")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "strike": "93000",
                            "venueLeg": "yes",
                            "venueCost": "0.45",
                            "continuousLeg": "Down",
                            "continuousCost": "0.53",
                            "quantity": 50
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], serde_json::json!("executed"));
        assert_eq!(body["quantity"], serde_json::json!(50));
    }

    #[tokio::test]
    async fn test_execute_unknown_strike_returns_404() {
        let mock = MockServer::start().await;
        mount_healthy_markets(&mock).await;
        let router = router_for(&mock.uri());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/trading/execute")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "strike": "99999",
                            "venueLeg": "yes",
                            "venueCost": "0.45",
                            "continuousLeg": "Down",
                            "continuousCost": "0.53",
                            "quantity": 50
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
