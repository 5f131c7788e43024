//! CRM client: custom-field catalog reads and contact writes.
//!
//! The catalog is the live list of contact custom fields for one account.
//! It is fetched with exactly one request per call (no retries) under an
//! explicit timeout; any failure surfaces as
//! [`LeadBridgeError::CatalogUnavailable`] so callers can degrade instead of
//! rejecting the lead.

mod cache;
mod wire;

use std::future::Future;
use std::time::Duration;

use leadbridge_shared::{
    CrmConfig, CrmCredentials, ExternalFieldDefinition, LeadBridgeError, Result,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info, instrument};

pub use cache::CatalogCache;
pub use wire::{ContactPayload, CustomFieldValue, UpsertOutcome, parse_catalog};

/// Default timeout in seconds for CRM requests.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Maximum catalog response size we accept (2 MB).
const MAX_CATALOG_SIZE: u64 = 2 * 1024 * 1024;

/// User-Agent string for CRM requests.
const USER_AGENT: &str = concat!("LeadBridge/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl From<&CrmConfig> for ClientOptions {
    fn from(config: &CrmConfig) -> Self {
        Self {
            timeout_secs: config.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogSource
// ---------------------------------------------------------------------------

/// Anything that can produce the custom-field catalog for an account.
pub trait CatalogSource: Send + Sync {
    /// Fetch the current catalog. Failures are `CatalogUnavailable`.
    fn fetch_catalog(
        &self,
        creds: &CrmCredentials,
    ) -> impl Future<Output = Result<Vec<ExternalFieldDefinition>>> + Send;
}

// ---------------------------------------------------------------------------
// CrmClient
// ---------------------------------------------------------------------------

/// HTTP client for the CRM API. Cheap to clone; clones share a connection pool.
#[derive(Debug, Clone)]
pub struct CrmClient {
    client: Client,
}

impl CrmClient {
    /// Build a client with the given options.
    pub fn new(opts: &ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| LeadBridgeError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Upsert a contact with its reconciled custom fields.
    ///
    /// One request, no retries. Failures are `Network` errors.
    #[instrument(skip_all, fields(location = %creds.location_id))]
    pub async fn upsert_contact(
        &self,
        creds: &CrmCredentials,
        payload: &ContactPayload,
    ) -> Result<UpsertOutcome> {
        let url = format!("{}/contacts/upsert", creds.base_url);

        info!(
            custom_fields = payload.custom_fields.len(),
            tags = payload.tags.len(),
            "upserting contact"
        );

        let response = authorized(self.client.post(&url), creds)
            .json(payload)
            .send()
            .await
            .map_err(|e| LeadBridgeError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LeadBridgeError::Network(format!("{url}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(LeadBridgeError::Network(format!(
                "{url}: HTTP {status}: {}",
                snippet(&body)
            )));
        }

        let outcome = wire::parse_upsert(&body);
        info!(contact_id = ?outcome.contact_id, created = outcome.created, "contact upserted");
        Ok(outcome)
    }
}

impl CatalogSource for CrmClient {
    #[instrument(skip_all, fields(location = %creds.location_id))]
    async fn fetch_catalog(&self, creds: &CrmCredentials) -> Result<Vec<ExternalFieldDefinition>> {
        let url = format!("{}/locations/{}/customFields", creds.base_url, creds.location_id);

        debug!(%url, "fetching custom field catalog");

        let response = authorized(self.client.get(&url), creds)
            .query(&[("model", "contact")])
            .send()
            .await
            .map_err(|e| unavailable(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let hint = match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => " (check the API token)",
                _ => "",
            };
            return Err(LeadBridgeError::CatalogUnavailable(format!(
                "{url}: HTTP {status}{hint}"
            )));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_CATALOG_SIZE {
                return Err(LeadBridgeError::CatalogUnavailable(format!(
                    "{url}: response too large ({len} bytes, max {MAX_CATALOG_SIZE})"
                )));
            }
        }

        let body = response.text().await.map_err(|e| unavailable(&url, e))?;

        let fields = parse_catalog(&body)
            .map_err(|e| LeadBridgeError::CatalogUnavailable(format!("{url}: {e}")))?;

        info!(fields = fields.len(), "custom field catalog fetched");
        Ok(fields)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn authorized(request: RequestBuilder, creds: &CrmCredentials) -> RequestBuilder {
    request
        .bearer_auth(&creds.token)
        .header("Version", &creds.api_version)
        .header(reqwest::header::ACCEPT, "application/json")
}

fn unavailable(url: &str, err: reqwest::Error) -> LeadBridgeError {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    LeadBridgeError::CatalogUnavailable(format!("{url}: {reason}"))
}

/// First 200 characters of an error body, for diagnostics.
fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadbridge_shared::FieldDataType;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds(server: &MockServer) -> CrmCredentials {
        CrmCredentials {
            base_url: server.uri(),
            location_id: "loc_123".into(),
            token: "test-token".into(),
            api_version: "2021-07-28".into(),
        }
    }

    fn client() -> CrmClient {
        CrmClient::new(&ClientOptions::default()).expect("build client")
    }

    #[tokio::test]
    async fn fetch_catalog_with_mock_server() {
        let server = MockServer::start().await;
        let body = std::fs::read_to_string("../../../fixtures/json/catalog.fixture.json")
            .expect("read catalog fixture");

        Mock::given(method("GET"))
            .and(path("/locations/loc_123/customFields"))
            .and(query_param("model", "contact"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("version", "2021-07-28"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let fields = client().fetch_catalog(&creds(&server)).await.unwrap();
        assert!(!fields.is_empty());
        assert!(fields.iter().any(|f| f.data_type == FieldDataType::MultiOption));
    }

    #[tokio::test]
    async fn auth_failure_is_catalog_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/locations/loc_123/customFields"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let err = client().fetch_catalog(&creds(&server)).await.unwrap_err();
        assert!(err.is_catalog_unavailable());
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/locations/loc_123/customFields"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = client().fetch_catalog(&creds(&server)).await.unwrap_err();
        assert!(err.is_catalog_unavailable());
        // `expect(1)` is verified when the server drops.
    }

    #[tokio::test]
    async fn malformed_body_is_catalog_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/locations/loc_123/customFields"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client().fetch_catalog(&creds(&server)).await.unwrap_err();
        assert!(err.is_catalog_unavailable());
    }

    #[tokio::test]
    async fn timeout_is_catalog_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/locations/loc_123/customFields"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"customFields":[]}"#)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = CrmClient::new(&ClientOptions { timeout_secs: 1 }).unwrap();
        let err = client.fetch_catalog(&creds(&server)).await.unwrap_err();
        assert!(err.is_catalog_unavailable());
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn unreachable_host_is_catalog_unavailable() {
        let creds = CrmCredentials {
            base_url: "http://127.0.0.1:9".into(),
            location_id: "loc_123".into(),
            token: "t".into(),
            api_version: "2021-07-28".into(),
        };
        let err = client().fetch_catalog(&creds).await.unwrap_err();
        assert!(err.is_catalog_unavailable());
    }

    #[tokio::test]
    async fn upsert_contact_sends_bare_keys() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/contacts/upsert"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({
                "email": "ada@example.com",
                "customFields": [{"key": "business_type", "field_value": "Agency"}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"new":true,"contact":{"id":"c_42"}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let payload = ContactPayload {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: None,
            location_id: "loc_123".into(),
            source: "website".into(),
            tags: vec!["lead-hot".into()],
            custom_fields: vec![CustomFieldValue::new(
                "f1",
                Some("contact.business_type"),
                "Agency",
            )],
        };

        let outcome = client().upsert_contact(&creds(&server), &payload).await.unwrap();
        assert_eq!(outcome.contact_id.as_deref(), Some("c_42"));
        assert!(outcome.created);
    }

    #[tokio::test]
    async fn upsert_failure_is_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/contacts/upsert"))
            .respond_with(ResponseTemplate::new(422).set_body_string(r#"{"message":"bad email"}"#))
            .mount(&server)
            .await;

        let payload = ContactPayload {
            first_name: "Ada".into(),
            last_name: String::new(),
            email: "nope".into(),
            phone: None,
            location_id: "loc_123".into(),
            source: "website".into(),
            tags: vec![],
            custom_fields: vec![],
        };

        let err = client().upsert_contact(&creds(&server), &payload).await.unwrap_err();
        assert!(matches!(err, LeadBridgeError::Network(_)));
        assert!(err.to_string().contains("bad email"));
    }
}
