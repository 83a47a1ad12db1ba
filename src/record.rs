//! The normalized row written for every ingested event

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One link-statistics event ready to be persisted
///
/// Built once per inbound message and never mutated; the storage write is
/// attempted exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionRecord {
    /// Operating system family, `"Other"` when unknown
    pub os: String,
    /// Major OS version
    pub os_version: Option<String>,
    /// Browser family, `"Other"` when unknown
    pub browser: String,
    pub browser_version: Option<String>,
    pub client_ip: Option<String>,
    /// Lowercase host, or the bare path when the URL had no host
    pub base_url: String,
    /// Lowercase path without surrounding slashes, empty without a host
    pub url_path: String,
    /// The URL exactly as the client sent it
    pub full_url: String,
    /// Receipt time
    pub created_at: DateTime<Utc>,
}

impl IngestionRecord {
    /// `created_at` in the `YYYY-MM-DD HH:MM:SS` form stored as text
    #[must_use]
    pub fn created_at_text(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
