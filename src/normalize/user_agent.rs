//! User-agent classification

use woothee::parser::Parser;

use crate::constants::store::UNKNOWN_FAMILY;

/// Marker woothee reports for fields it could not classify
const WOOTHEE_UNKNOWN: &str = "UNKNOWN";

/// Browser and operating system derived from a user-agent string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub os: String,
    /// Major version only, e.g. `"8"` for Android 8.0.0
    pub os_version: Option<String>,
    pub browser: String,
    pub browser_version: Option<String>,
}

impl UserAgentInfo {
    /// The classification used when nothing is recognized
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            os: UNKNOWN_FAMILY.to_string(),
            os_version: None,
            browser: UNKNOWN_FAMILY.to_string(),
            browser_version: None,
        }
    }
}

/// Classify a user-agent string
///
/// Empty or unrecognized input yields family `"Other"` without versions.
#[must_use]
pub fn parse_user_agent(ua: Option<&str>) -> UserAgentInfo {
    let ua = match ua.map(str::trim) {
        Some(ua) if !ua.is_empty() => ua,
        _ => return UserAgentInfo::unknown(),
    };

    let Some(result) = Parser::new().parse(ua) else {
        return UserAgentInfo::unknown();
    };

    UserAgentInfo {
        os: family(result.os),
        os_version: known(&result.os_version).and_then(major_version),
        browser: family(result.name),
        browser_version: known(result.version).map(str::to_string),
    }
}

fn known(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != WOOTHEE_UNKNOWN).then_some(value)
}

fn family(value: &str) -> String {
    known(value).unwrap_or(UNKNOWN_FAMILY).to_string()
}

/// First run of digits, e.g. `"10.15.7"` -> `"10"`, `"NT 10.0"` -> `"10"`
///
/// Versions without digits (`"XP"`) are kept whole.
fn major_version(version: &str) -> Option<String> {
    match version.find(|c: char| c.is_ascii_digit()) {
        Some(start) => {
            let digits: String = version[start..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            Some(digits)
        }
        None => Some(version.to_string()),
    }
}
