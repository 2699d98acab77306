//! Exported resource documents and aggregation

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered collection of opaque resource records.
///
/// Serializes to the Terraform-JSON shape `{"resource": [...]}`. The core
/// never interprets record contents; it only concatenates and counts them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportedDocument {
    /// Resource records in export order
    #[serde(rename = "resource", default)]
    pub resources: Vec<Value>,
}

impl ExportedDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from a list of resource records
    pub fn from_resources(resources: Vec<Value>) -> Self {
        Self { resources }
    }

    /// Append one resource record
    pub fn push(&mut self, record: Value) {
        self.resources.push(record);
    }

    /// Number of resource records
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the document has no records
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Merge documents into one, preserving input order and each document's
    /// internal order.
    ///
    /// No deduplication happens here: duplicate resource identifiers across
    /// modules pass through unchanged, and uniqueness checks belong to the
    /// downstream policy validators.
    pub fn merge<I>(documents: I) -> ExportedDocument
    where
        I: IntoIterator<Item = ExportedDocument>,
    {
        let mut merged = ExportedDocument::new();
        for document in documents {
            merged.resources.extend(document.resources);
        }
        merged
    }
}
