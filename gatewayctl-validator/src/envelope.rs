use gatewayctl_core::ApiConfiguration;
use serde::{Deserialize, Serialize};

/// Content type of a submitted configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Yaml,
    Json,
}

/// The recognized top-level envelope of a submitted configuration document.
/// Unknown top-level keys are rejected by `deny_unknown_fields`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmittedDocument {
    pub version: String,
    pub kind: String,
    pub data: ApiConfiguration,
}

/// Parse error for a submitted document: malformed syntax, not a validation
/// failure of the contained configuration.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn parse(bytes: &[u8], content_type: ContentType) -> Result<SubmittedDocument, ParseError> {
    match content_type {
        ContentType::Yaml => Ok(serde_yaml::from_slice(bytes)?),
        ContentType::Json => Ok(serde_json::from_slice(bytes)?),
    }
}
