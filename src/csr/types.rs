use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A validated certificate-signing-request descriptor.
///
/// Field names on the wire follow the CFSSL request format. Keys the
/// schema does not declare are kept in `extra` and sent to the CA as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrDescriptor {
    /// Subject common name (`CN`).
    #[serde(rename = "CN")]
    pub common_name: String,
    pub key: KeySpec,
    /// Distinguished-name component sets, in document order.
    pub names: Vec<NameEntry>,
    /// DNS names and IP literals the certificate must cover.
    pub hosts: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Requested key parameters. Both fields may be absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KeySpec {
    /// Key size in bits, when it is given as a non-negative integer.
    pub fn bits(&self) -> Option<u64> {
        self.size.as_ref().and_then(Number::as_u64)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NameEntry {
    #[serde(rename = "C", default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "L", default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(rename = "ST", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "O", default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(rename = "OU", default, skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
