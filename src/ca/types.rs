use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::csr::CsrDescriptor;

/// The three artifacts returned by a successful issuance call.
///
/// `private_key` is wiped from memory on drop and never shown by `Debug`.
pub struct IssuanceResult {
    pub certificate_request: String,
    pub certificate: String,
    pub private_key: Zeroizing<String>,
}

impl fmt::Debug for IssuanceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuanceResult")
            .field("certificate_request", &self.certificate_request)
            .field("certificate", &self.certificate)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Request envelope for `POST /api/v1/cfssl/newcert`.
#[derive(Serialize)]
pub(crate) struct NewCertRequest<'a> {
    pub request: &'a CsrDescriptor,
}

/// Standard CFSSL API response envelope.
#[derive(Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub result: Option<NewCertResult>,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

#[derive(Deserialize)]
pub(crate) struct NewCertResult {
    #[serde(default)]
    pub certificate_request: Option<String>,
    #[serde(default)]
    pub certificate: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

impl ApiMessage {
    pub fn join(messages: &[ApiMessage]) -> Option<String> {
        if messages.is_empty() {
            return None;
        }
        Some(
            messages
                .iter()
                .map(|msg| match msg.code {
                    Some(code) => format!("{}: {}", code, msg.message),
                    None => msg.message.clone(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

impl NewCertResult {
    /// Turns the decoded `result` object into an [`IssuanceResult`],
    /// naming the first field the CA left out.
    pub fn into_issuance(self) -> Result<IssuanceResult, &'static str> {
        let certificate_request = self
            .certificate_request
            .ok_or("result.certificate_request")?;
        let certificate = self.certificate.ok_or("result.certificate")?;
        let private_key = Zeroizing::new(self.private_key.ok_or("result.private_key")?);
        Ok(IssuanceResult {
            certificate_request,
            certificate,
            private_key,
        })
    }
}
