//! HTTP transport for the TecDoc catalog JSON endpoint.
//!
//! The normalization core only needs "send a request descriptor, get a JSON
//! object back". [`Transport`] is that seam; [`TecdocClient`] implements it
//! over `reqwest`. A failed call never surfaces as an error: it is logged and
//! reported as an empty object, which the core treats as "no data".

mod requests;

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use tecdoc_shared::{ApiConfig, Result, TecdocError};

pub use requests::{ApiRequest, LinkedPair, Requests};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("tecdoc-export/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Synchronous-in-spirit request/response call: one request, one JSON object.
///
/// Implementations must return an empty object on any failure.
pub trait Transport {
    fn call(&self, request: &ApiRequest) -> impl Future<Output = Value> + Send;
}

/// The value a failed call resolves to.
pub fn empty_payload() -> Value {
    Value::Object(Map::new())
}

// ---------------------------------------------------------------------------
// TecdocClient
// ---------------------------------------------------------------------------

/// `reqwest`-backed transport posting to the configured endpoint.
#[derive(Debug, Clone)]
pub struct TecdocClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TecdocClient {
    /// Build a client, reading the API key from the configured env var.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::with_api_key(config, api_key)
    }

    /// Build a client with an explicit API key.
    pub fn with_api_key(config: &ApiConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TecdocError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: api_key.into(),
        })
    }

    /// Perform the call, surfacing every failure as an error.
    async fn try_call(&self, request: &ApiRequest) -> Result<Value> {
        let op = request.operation;
        let response = self
            .client
            .post(&self.base_url)
            .header("content-type", "application/json;charset=UTF-8")
            .header("x-api-key", &self.api_key)
            .json(&request.body())
            .send()
            .await
            .map_err(|e| TecdocError::Network(format!("{op}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TecdocError::Network(format!("{op}: HTTP {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TecdocError::parse(format!("{op}: invalid JSON body: {e}")))?;

        if !body.is_object() {
            return Err(TecdocError::parse(format!("{op}: response is not a JSON object")));
        }

        // The API reports some failures in-band with a 200.
        if let Some(code) = body.get("status").and_then(Value::as_i64) {
            if code >= 400 {
                warn!(operation = op, status = code, response = %body, "API reported an error");
            }
        }

        Ok(body)
    }
}

impl Transport for TecdocClient {
    async fn call(&self, request: &ApiRequest) -> Value {
        match self.try_call(request).await {
            Ok(body) => {
                debug!(operation = request.operation, "request succeeded");
                body
            }
            Err(e) => {
                warn!(
                    operation = request.operation,
                    error = %e,
                    "API request failed, continuing with empty payload"
                );
                empty_payload()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_for(uri: &str) -> ApiConfig {
        ApiConfig {
            base_url: uri.to_string(),
            provider: 4711,
            timeout_secs: 5,
            ..ApiConfig::default()
        }
    }

    #[tokio::test]
    async fn test_call_posts_operation_body_with_key() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::header("x-api-key", "secret"))
            .and(wiremock::matchers::body_partial_json(json!({
                "getArticleCriteria": { "articleId": 42, "provider": 4711 }
            })))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "array": [{ "criteriaId": 1 }] } })),
            )
            .mount(&server)
            .await;

        let config = config_for(&server.uri());
        let client = TecdocClient::with_api_key(&config, "secret").unwrap();
        let request = Requests::new(&config).article_criteria(42);

        let body = client.call(&request).await;
        assert_eq!(body["data"]["array"][0]["criteriaId"], 1);
    }

    #[tokio::test]
    async fn test_http_error_yields_empty_object() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = config_for(&server.uri());
        let client = TecdocClient::with_api_key(&config, "secret").unwrap();
        let body = client.call(&Requests::new(&config).brand_info(355)).await;

        assert_eq!(body, empty_payload());
    }

    #[tokio::test]
    async fn test_non_json_body_yields_empty_object() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let config = config_for(&server.uri());
        let client = TecdocClient::with_api_key(&config, "secret").unwrap();
        let body = client.call(&Requests::new(&config).brand_info(355)).await;

        assert_eq!(body, empty_payload());
    }

    #[tokio::test]
    async fn test_non_object_body_yields_empty_object() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .mount(&server)
            .await;

        let config = config_for(&server.uri());
        let client = TecdocClient::with_api_key(&config, "secret").unwrap();
        let body = client.call(&Requests::new(&config).brand_info(355)).await;

        assert_eq!(body, empty_payload());
    }

    #[tokio::test]
    async fn test_in_band_error_status_is_passed_through() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": 400, "statusText": "Bad Request" })),
            )
            .mount(&server)
            .await;

        let config = config_for(&server.uri());
        let client = TecdocClient::with_api_key(&config, "secret").unwrap();
        let body = client.call(&Requests::new(&config).article_relations(1)).await;

        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_empty_object() {
        // Bind and drop a listener so the port is (almost certainly) closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = config_for(&format!("http://127.0.0.1:{port}/endpoint"));
        let client = TecdocClient::with_api_key(&config, "secret").unwrap();
        let body = client.call(&Requests::new(&config).article_components(1)).await;

        assert_eq!(body, empty_payload());
    }
}
