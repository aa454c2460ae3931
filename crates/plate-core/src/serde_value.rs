//! JSON envelope for documents handed to the host or kept on disk.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Document;

pub const DOCUMENT_SCHEMA: &str = "webtext";
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DocumentFormatError {
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown document schema `{0}`")]
    Schema(String),
    #[error("document version {found} is newer than supported version {supported}")]
    Version { found: u32, supported: u32 },
}

/// A document tagged with the schema it was written under.
///
/// Envelopes without a header are read as the current schema and version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    #[serde(default = "schema_name")]
    pub schema: String,
    #[serde(default = "schema_version")]
    pub version: u32,
    pub document: Document,
}

fn schema_name() -> String {
    DOCUMENT_SCHEMA.to_string()
}

fn schema_version() -> u32 {
    DOCUMENT_VERSION
}

impl StructuredDocument {
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: schema_name(),
            version: DOCUMENT_VERSION,
            document,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reads an envelope, rejecting foreign schemas and versions from the future.
    pub fn parse(json: &str) -> Result<Self, DocumentFormatError> {
        let envelope: Self = serde_json::from_str(json)?;
        if envelope.schema != DOCUMENT_SCHEMA {
            return Err(DocumentFormatError::Schema(envelope.schema));
        }
        if envelope.version > DOCUMENT_VERSION {
            return Err(DocumentFormatError::Version {
                found: envelope.version,
                supported: DOCUMENT_VERSION,
            });
        }
        Ok(envelope)
    }
}

impl Default for StructuredDocument {
    fn default() -> Self {
        Self::from_document(Document::default())
    }
}
