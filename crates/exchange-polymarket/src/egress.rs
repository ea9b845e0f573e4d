//! Proxy-aware HTTP egress for Polymarket endpoints.
//!
//! Polymarket traffic can optionally leave through a SOCKS5 or HTTP
//! proxy. A proxy transport failure degrades the request to the direct
//! client and records the degraded route, so a dead proxy slows a cycle
//! down rather than killing it.

use crate::error::{PolymarketError, Result};
use hourly_edge_core::ProxyConfig;
use reqwest::{Client, Proxy, Response};

/// How a request actually left the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Sent through the configured proxy.
    Proxy,
    /// Proxy failed mid-request, retried direct.
    DirectFallback,
    /// No proxy configured.
    Direct,
}

impl Route {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::DirectFallback => "direct (proxy unavailable)",
            Self::Direct => "direct",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP client pair: an always-present direct client and an optional
/// proxied one.
pub struct ProxiedHttp {
    direct: Client,
    proxied: Option<Client>,
}

impl std::fmt::Debug for ProxiedHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxiedHttp")
            .field("proxied", &self.proxied.is_some())
            .finish_non_exhaustive()
    }
}

impl ProxiedHttp {
    /// Builds the client pair from proxy configuration.
    ///
    /// A proxy URL that fails to parse is logged and skipped, never
    /// fatal. SOCKS5 is preferred over HTTP when both are set.
    ///
    /// # Errors
    /// Returns error if the direct HTTP client cannot be built.
    pub fn new(proxy: &ProxyConfig, timeout_secs: u64) -> Result<Self> {
        let timeout = std::time::Duration::from_secs(timeout_secs);

        let direct = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PolymarketError::Network(format!("failed to build HTTP client: {e}")))?;

        let proxied = if proxy.enabled {
            Self::build_proxied(proxy, timeout)
        } else {
            None
        };

        Ok(Self { direct, proxied })
    }

    /// Builds a direct-only client pair.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn direct_only(timeout_secs: u64) -> Result<Self> {
        let direct = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PolymarketError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            direct,
            proxied: None,
        })
    }

    fn build_proxied(proxy: &ProxyConfig, timeout: std::time::Duration) -> Option<Client> {
        let candidates = [
            proxy.socks5_url.as_deref(),
            proxy.http_url.as_deref(),
        ];

        for url in candidates.into_iter().flatten() {
            match Proxy::all(url) {
                Ok(p) => match Client::builder().timeout(timeout).proxy(p).build() {
                    Ok(client) => {
                        tracing::info!(proxy_url = %url, "proxy egress enabled");
                        return Some(client);
                    }
                    Err(e) => {
                        tracing::warn!(proxy_url = %url, error = %e, "failed to build proxied client");
                    }
                },
                Err(e) => {
                    tracing::warn!(proxy_url = %url, error = %e, "invalid proxy url");
                }
            }
        }

        None
    }

    /// True when a proxied client is available.
    #[must_use]
    pub fn has_proxy(&self) -> bool {
        self.proxied.is_some()
    }

    /// Sends a GET request, degrading from proxy to direct on transport
    /// failure. HTTP error statuses are returned as-is, only transport
    /// errors trigger the fallback.
    ///
    /// # Errors
    /// Returns error if the request fails on every available route.
    pub async fn get(&self, url: &str) -> Result<(Response, Route)> {
        if let Some(proxied) = &self.proxied {
            match proxied
                .get(url)
                .header("Accept", "application/json")
                .send()
                .await
            {
                Ok(response) => return Ok((response, Route::Proxy)),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "proxy request failed, retrying direct");
                }
            }

            let response = self
                .direct
                .get(url)
                .header("Accept", "application/json")
                .send()
                .await?;
            return Ok((response, Route::DirectFallback));
        }

        let response = self
            .direct
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;
        Ok((response, Route::Direct))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn disabled_proxy() -> ProxyConfig {
        ProxyConfig {
            enabled: false,
            socks5_url: None,
            http_url: None,
        }
    }

    // ==================== Route Tests ====================

    #[test]
    fn test_route_strings() {
        assert_eq!(Route::Proxy.as_str(), "proxy");
        assert_eq!(Route::DirectFallback.as_str(), "direct (proxy unavailable)");
        assert_eq!(Route::Direct.as_str(), "direct");
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_disabled_proxy_builds_direct_only() {
        let http = ProxiedHttp::new(&disabled_proxy(), 10).unwrap();
        assert!(!http.has_proxy());
    }

    #[test]
    fn test_invalid_proxy_url_degrades_to_direct() {
        let proxy = ProxyConfig {
            enabled: true,
            socks5_url: Some("not a url".to_string()),
            http_url: None,
        };
        let http = ProxiedHttp::new(&proxy, 10).unwrap();
        assert!(!http.has_proxy());
    }

    #[test]
    fn test_valid_proxy_url_builds_proxied_client() {
        let proxy = ProxyConfig {
            enabled: true,
            socks5_url: Some("socks5://127.0.0.1:9050".to_string()),
            http_url: None,
        };
        let http = ProxiedHttp::new(&proxy, 10).unwrap();
        assert!(http.has_proxy());
    }

    // ==================== Request Tests ====================

    #[tokio::test]
    async fn test_direct_get_records_direct_route() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let http = ProxiedHttp::direct_only(10).unwrap();
        let (response, route) = http
            .get(&format!("{}/ping", mock_server.uri()))
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(route, Route::Direct);
    }

    #[tokio::test]
    async fn test_dead_proxy_falls_back_to_direct() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        // Nothing listens on this port, so the proxied attempt fails.
        let proxy = ProxyConfig {
            enabled: true,
            socks5_url: Some("socks5://127.0.0.1:1".to_string()),
            http_url: None,
        };
        let http = ProxiedHttp::new(&proxy, 10).unwrap();
        assert!(http.has_proxy());

        let (response, route) = http
            .get(&format!("{}/ping", mock_server.uri()))
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(route, Route::DirectFallback);
    }
}
