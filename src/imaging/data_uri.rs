//! `data:<mime>;base64,<payload>` encoding used for every image crossing the HTTP boundary.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Mime type assumed when a data URI header does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("Not a data URI (missing 'data:' prefix)")]
    MissingScheme,

    #[error("Data URI has no payload separator")]
    MissingSeparator,

    #[error("Only base64 data URIs are supported")]
    NotBase64,

    #[error("Invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// An image split into its mime type and base64 payload.
///
/// The payload is kept in its encoded form so that reassembling through
/// `Display` reproduces the original string byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime_type: String,
    payload: String,
}

impl DataUri {
    pub fn new(mime_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    /// Builds a data URI by base64-encoding raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, BASE64.encode(bytes))
    }

    pub fn parse(s: &str) -> Result<Self, DataUriError> {
        let rest = s.strip_prefix("data:").ok_or(DataUriError::MissingScheme)?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or(DataUriError::MissingSeparator)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(DataUriError::NotBase64)?;
        let mime_type = if mime_type.is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            mime_type
        };
        Ok(Self::new(mime_type, payload))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload, as sent to the model's `inlineData.data` field.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn decode(&self) -> Result<Vec<u8>, DataUriError> {
        BASE64
            .decode(self.payload.as_bytes())
            .map_err(|e| DataUriError::InvalidPayload(e.to_string()))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.payload)
    }
}

impl FromStr for DataUri {
    type Err = DataUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
