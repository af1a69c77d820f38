use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;

use super::config::CaConfig;
use super::types::{ApiMessage, ApiResponse, IssuanceResult, NewCertRequest};
use crate::csr::CsrDescriptor;

/// Failures of a single issuance call. No variant is retried here.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The HTTP client could not be built from the configuration; no
    /// request was sent.
    #[error("CA client configuration error: {0}")]
    Client(#[source] reqwest::Error),
    /// The CA could not be reached or did not answer in time.
    #[error("CA transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// The CA answered but did not issue a certificate.
    #[error("CA service error{}: {detail}", status_suffix(.status))]
    Service {
        status: Option<u16>,
        detail: String,
    },
}

impl IssueError {
    /// Only transport failures may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, IssueError::Transport(_))
    }

    fn service(status: StatusCode, detail: impl Into<String>) -> Self {
        IssueError::Service {
            status: Some(status.as_u16()),
            detail: detail.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

/// Blocking client for the CFSSL `newcert` endpoint.
///
/// Cheap to clone and safe to share across threads; each [`CaClient::issue`]
/// call is independent.
#[derive(Clone)]
pub struct CaClient {
    config: CaConfig,
    http: Client,
}

impl CaClient {
    pub fn new(config: CaConfig) -> Result<Self, IssueError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(IssueError::Client)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &CaConfig {
        &self.config
    }

    /// Submits `descriptor` wrapped as `{"request": ...}` in exactly one
    /// POST and unwraps the CA's `result` object.
    pub fn issue(&self, descriptor: &CsrDescriptor) -> Result<IssuanceResult, IssueError> {
        let url = self.config.endpoint_url();
        info!(
            "[ca] requesting certificate for CN={} from {}",
            descriptor.common_name, url
        );

        let response = self
            .http
            .post(&url)
            .json(&NewCertRequest {
                request: descriptor,
            })
            .send()
            .map_err(|err| {
                warn!("[ca] request to {url} failed: {err}");
                IssueError::Transport(err)
            })?;

        let status = response.status();
        let body = response.text().map_err(IssueError::Transport)?;
        debug!("[ca] response status {} ({} bytes)", status, body.len());

        decode_response(status, &body)
    }
}

fn decode_response(status: StatusCode, body: &str) -> Result<IssuanceResult, IssueError> {
    let parsed = serde_json::from_str::<ApiResponse>(body);

    if !status.is_success() {
        let detail = parsed
            .ok()
            .and_then(|envelope| ApiMessage::join(&envelope.errors))
            .or_else(|| non_empty(body))
            .unwrap_or_else(|| status.to_string());
        warn!("[ca] CA rejected request with {status}: {detail}");
        return Err(IssueError::service(status, detail));
    }

    let envelope = parsed.map_err(|err| {
        IssueError::service(status, format!("malformed CA response: {err}"))
    })?;

    if envelope.success == Some(false) {
        let detail = ApiMessage::join(&envelope.errors)
            .unwrap_or_else(|| "CA reported an unsuccessful response".to_string());
        warn!("[ca] CA reported failure: {detail}");
        return Err(IssueError::service(status, detail));
    }

    let result = envelope
        .result
        .ok_or_else(|| IssueError::service(status, "CA response is missing result"))?;
    let issued = result.into_issuance().map_err(|field| {
        IssueError::service(status, format!("CA response is missing {field}"))
    })?;

    info!("[ca] certificate issued");
    Ok(issued)
}

fn non_empty(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
