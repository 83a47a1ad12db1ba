//! Record normalization
//!
//! Pure functions that turn the raw fields of an inbound event into an
//! [`IngestionRecord`]. Nothing here performs I/O.

mod url;
mod user_agent;

pub use self::url::{NormalizedUrl, UrlParts, normalize_url};
pub use user_agent::{UserAgentInfo, parse_user_agent};

use chrono::{DateTime, Utc};

use crate::record::IngestionRecord;

/// Raw, unvalidated event fields as received from a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawEvent<'a> {
    pub ua: Option<&'a str>,
    pub url: Option<&'a str>,
    pub client_ip: Option<&'a str>,
}

/// Build the record persisted for one event received at `received_at`
#[must_use]
pub fn normalize_event(event: RawEvent<'_>, received_at: DateTime<Utc>) -> IngestionRecord {
    let agent = parse_user_agent(event.ua);
    let url = normalize_url(event.url);

    IngestionRecord {
        os: agent.os,
        os_version: agent.os_version,
        browser: agent.browser,
        browser_version: agent.browser_version,
        client_ip: event
            .client_ip
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string),
        base_url: url.base_url,
        url_path: url.url_path,
        full_url: url.full_url,
        created_at: received_at,
    }
}
