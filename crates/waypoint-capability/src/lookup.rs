//! Location/data-lookup capability
//!
//! Read-only queries against the civic-data store (places, facilities,
//! programs). Absence of a record is a normal answer, not an error.

use crate::error::CapabilityError;
use serde::{Deserialize, Serialize};

/// A single civic-data record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Display name ("카페 온", "함안 도서관", ...)
    pub name: String,
    /// Category tag ("cafe", "library", "market", ...)
    pub category: String,
    /// Administrative region the record belongs to
    pub region: String,
    /// Short human-readable description
    pub description: String,
}

impl LocationRecord {
    /// Create a new record
    #[inline]
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        region: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            region: region.into(),
            description: description.into(),
        }
    }
}

/// Opaque read-only lookup capability
#[async_trait::async_trait]
pub trait LocationLookup: Send + Sync {
    /// Find the best record for a category, optionally narrowed by region.
    ///
    /// Returns `Ok(None)` when nothing matches; `Err` only for transport-level
    /// failures of the backing store.
    async fn find_by_category(
        &self,
        category: &str,
        region: Option<&str>,
    ) -> Result<Option<LocationRecord>, CapabilityError>;
}
