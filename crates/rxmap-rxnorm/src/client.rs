//! RxNav REST client.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RxNormError};
use crate::types::{ApproximateResponse, DrugsResponse};

/// Public NLM RxNav endpoint.
pub const DEFAULT_BASE_URL: &str = "https://rxnav.nlm.nih.gov/REST";

const USER_AGENT_VALUE: &str = concat!("rxnorm-mapper/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RxNavSettings {
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub max_approximate_entries: u32,
}

impl Default for RxNavSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            max_approximate_entries: 5,
        }
    }
}

/// Terminology lookups the validator depends on.
///
/// `Ok(None)` means the service answered with a non-success status.
pub trait TerminologyService {
    fn find_drugs(&self, name: &str) -> Result<Option<DrugsResponse>>;

    fn approximate_term(&self, term: &str, max_entries: u32)
    -> Result<Option<ApproximateResponse>>;
}

/// Blocking RxNav client.
pub struct RxNavClient {
    client: Client,
    base_url: String,
}

impl RxNavClient {
    pub fn new(settings: &RxNavSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RxNormError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn drugs_url(&self, name: &str) -> String {
        format!(
            "{}/drugs.json?name={}",
            self.base_url,
            urlencoding::encode(name)
        )
    }

    fn approximate_url(&self, term: &str, max_entries: u32) -> String {
        format!(
            "{}/approximateTerm.json?term={}&maxEntries={max_entries}",
            self.base_url,
            urlencoding::encode(term)
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        debug!(%url, "rxnav request");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "rxnav returned non-success status");
            return Ok(None);
        }

        let text = response.text()?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

impl TerminologyService for RxNavClient {
    fn find_drugs(&self, name: &str) -> Result<Option<DrugsResponse>> {
        self.get_json(&self.drugs_url(name))
    }

    fn approximate_term(
        &self,
        term: &str,
        max_entries: u32,
    ) -> Result<Option<ApproximateResponse>> {
        self.get_json(&self.approximate_url(term, max_entries))
    }
}
