//! Network access to the metrics backend.

use async_trait::async_trait;

use super::response::MetricsQueryResponse;
use crate::error::EngineResult;

/// Executes rendered queries against the metrics backend.
///
/// * `Ok(None)`: backend unavailable or the payload could not be parsed.
///   The engine degrades that combination to zero series.
/// * `Ok(Some(r))`: a parsed payload, possibly carrying backend errors.
/// * `Err(_)`: an unrecoverable fault. Handling follows the executor's
///   fault policy.
///
/// Implementations are shared across concurrent tasks and must not rely on
/// per-call mutable state. Timeouts are the implementation's responsibility.
#[async_trait]
pub trait MetricsClient: Send + Sync {
    async fn query(
        &self,
        query: &str,
        session_scope: &str,
    ) -> EngineResult<Option<MetricsQueryResponse>>;
}

#[cfg(feature = "http-client")]
pub use http::HttpProxyClient;

#[cfg(feature = "http-client")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::Serialize;

    use super::MetricsClient;
    use crate::config::BackendConfig;
    use crate::error::{EngineError, EngineResult};
    use crate::graphql::response::MetricsQueryResponse;

    const BODY_PREVIEW: usize = 1000;
    const QUERY_PREVIEW: usize = 300;

    #[derive(Serialize)]
    struct QueryPayload<'a> {
        query: &'a str,
        variables: serde_json::Map<String, serde_json::Value>,
    }

    #[derive(Serialize)]
    struct ProxyRequest<'a> {
        operation: &'static str,
        target: &'static str,
        url: &'a str,
        payload: QueryPayload<'a>,
    }

    /// Posts queries to an authenticating proxy that forwards them to the
    /// metrics backend's query endpoint.
    #[derive(Debug, Clone)]
    pub struct HttpProxyClient {
        http: reqwest::Client,
        proxy_url: String,
        graphql_url: String,
    }

    impl HttpProxyClient {
        pub fn new(
            proxy_url: impl Into<String>,
            graphql_url: impl Into<String>,
            timeout: Duration,
        ) -> EngineResult<Self> {
            let http = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| {
                    EngineError::configuration(format!("Failed to build HTTP client: {}", e))
                })?;
            Ok(Self {
                http,
                proxy_url: proxy_url.into(),
                graphql_url: graphql_url.into(),
            })
        }

        pub fn from_config(config: &BackendConfig) -> EngineResult<Self> {
            if config.proxy_url.is_empty() || config.graphql_url.is_empty() {
                return Err(EngineError::configuration(
                    "backend.proxy_url and backend.graphql_url must both be set",
                ));
            }
            Self::new(
                config.proxy_url.clone(),
                config.graphql_url.clone(),
                Duration::from_secs(config.timeout_secs),
            )
        }
    }

    fn preview(text: &str, max: usize) -> &str {
        match text.char_indices().nth(max) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }

    #[async_trait]
    impl MetricsClient for HttpProxyClient {
        async fn query(
            &self,
            query: &str,
            session_scope: &str,
        ) -> EngineResult<Option<MetricsQueryResponse>> {
            let body = ProxyRequest {
                operation: "query",
                target: "graphql",
                url: &self.graphql_url,
                payload: QueryPayload {
                    query,
                    variables: serde_json::Map::new(),
                },
            };

            let response = match self
                .http
                .post(&self.proxy_url)
                .bearer_auth(session_scope)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) if e.is_builder() => {
                    return Err(EngineError::query_fault(format!(
                        "Invalid proxy request: {}",
                        e
                    )));
                }
                Err(e) => {
                    log::error!("[metrics-proxy] Request failed: {}", e);
                    return Ok(None);
                }
            };

            let status = response.status();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    log::error!("[metrics-proxy] Failed to read response body: {}", e);
                    return Ok(None);
                }
            };

            if status != reqwest::StatusCode::OK {
                log::error!(
                    "[metrics-proxy] Error {} (Content-Type={}). Body preview: {}. Query preview: {}",
                    status,
                    content_type,
                    preview(&text, BODY_PREVIEW),
                    preview(query, QUERY_PREVIEW)
                );
                return Ok(None);
            }

            match serde_json::from_str::<MetricsQueryResponse>(&text) {
                Ok(parsed) => Ok(Some(parsed)),
                Err(e) => {
                    log::error!(
                        "[metrics-proxy] Validation error: {}. Raw: {}",
                        e,
                        preview(&text, BODY_PREVIEW)
                    );
                    Ok(None)
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_proxy_payload_shape() {
            let body = ProxyRequest {
                operation: "query",
                target: "graphql",
                url: "https://metrics.example/graphql",
                payload: QueryPayload {
                    query: "query { x }",
                    variables: serde_json::Map::new(),
                },
            };
            let json = serde_json::to_value(&body).unwrap();
            assert_eq!(json["operation"], "query");
            assert_eq!(json["target"], "graphql");
            assert_eq!(json["payload"]["query"], "query { x }");
            assert!(json["payload"]["variables"].as_object().unwrap().is_empty());
        }

        #[test]
        fn test_preview_respects_char_boundaries() {
            assert_eq!(preview("héllo", 2), "hé");
            assert_eq!(preview("abc", 10), "abc");
        }

        #[test]
        fn test_from_config_requires_urls() {
            let config = BackendConfig::default();
            assert!(HttpProxyClient::from_config(&config).is_err());
        }

        #[tokio::test]
        async fn test_unreachable_proxy_degrades_to_none() {
            let client = HttpProxyClient::new(
                "http://127.0.0.1:9/proxy",
                "http://backend/graphql",
                Duration::from_millis(500),
            )
            .unwrap();
            let result = client.query("query { x }", "token").await.unwrap();
            assert!(result.is_none());
        }
    }
}
