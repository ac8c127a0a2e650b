use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::JobFillError;
use crate::field::field_model::UnknownFieldRecord;
use crate::profile::profile_model::{DomainMappings, ProfileData};

pub const DEFAULT_API_BASE: &str = "http://localhost:3001/api";

/// What the backend reports after persisting captured fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmitSummary {
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "count_entries")]
    pub created: usize,
    #[serde(default)]
    pub skipped: Vec<String>,
}

fn count_entries<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entries: Vec<serde::de::IgnoredAny> = Vec::deserialize(deserializer)?;
    Ok(entries.len())
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Blocking client for the profile backend. Authentication is a bearer
/// token taken from configuration.
pub struct ApiClient {
    base: Url,
    token: Option<String>,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, JobFillError> {
        // A trailing slash keeps the last base segment when joining.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalized).map_err(|e| JobFillError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(JobFillError::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a hierarchical URL".into(),
            });
        }
        Ok(Self {
            base,
            token,
            http: Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// `{base}/{segments...}`, each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, JobFillError> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| JobFillError::InvalidUrl {
                url: self.base.to_string(),
                reason: "not a hierarchical URL".into(),
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// `GET /profile/fill`: the flattened profile plus generic field mappings.
    pub fn fetch_fill_profile(&self) -> Result<ProfileData, JobFillError> {
        let url = self.endpoint(&["profile", "fill"])?;
        debug!(%url, "fetching fill profile");
        let response = self.authorized(self.http.get(url.clone())).send()?;
        read_json(url, response)
    }

    /// `GET /unknown-fields/domain/{domain}`. Any non-success answer means
    /// there are no overrides for this site.
    pub fn fetch_domain_mappings(&self, domain: &str) -> Result<DomainMappings, JobFillError> {
        let url = self.endpoint(&["unknown-fields", "domain", domain])?;
        let response = self.authorized(self.http.get(url.clone())).send()?;
        if !response.status().is_success() {
            warn!(%url, status = response.status().as_u16(), "no domain mappings");
            return Ok(DomainMappings::default());
        }
        read_json(url, response)
    }

    /// `POST /unknown-fields` with the captured records.
    pub fn submit_unknown_fields(&self, records: &[UnknownFieldRecord]) -> Result<SubmitSummary, JobFillError> {
        if records.is_empty() {
            return Ok(SubmitSummary::default());
        }
        let url = self.endpoint(&["unknown-fields"])?;
        let response = self
            .authorized(self.http.post(url.clone()))
            .json(records)
            .send()?;
        let summary: SubmitSummary = read_json(url, response)?;
        info!(
            created = summary.created,
            skipped = summary.skipped.len(),
            "submitted unknown fields"
        );
        Ok(summary)
    }
}

fn read_json<T: DeserializeOwned>(url: Url, response: Response) -> Result<T, JobFillError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        return Err(JobFillError::Api {
            endpoint: url.to_string(),
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json()?)
}
