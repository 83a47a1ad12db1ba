//! URL splitting and canonicalization

use percent_encoding::percent_decode_str;
use url::Url;

/// Longest prefix of the raw URL that is parsed; `full_url` keeps everything
const MAX_PARSED_CHARS: usize = 1000;

/// Characters trimmed from both ends of `base_url` and `url_path`
///
/// Slashes, ASCII whitespace, NUL, vertical tab and the zero-width
/// joiner/non-joiner that copy-pasted links tend to carry.
fn is_trimmed(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B' | '/' | '\u{200C}' | '\u{200D}'
    )
}

/// Components of a URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Percent-decoded path
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl UrlParts {
    /// Split `raw` into components
    ///
    /// Absolute URLs and protocol-relative `//host/path` inputs yield a host;
    /// anything else is treated as a bare path with query and fragment removed.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = truncate_chars(raw.trim(), MAX_PARSED_CHARS);
        if raw.is_empty() {
            return Self::default();
        }

        let (candidate, relative_scheme) = match raw.strip_prefix("//") {
            Some(rest) => (format!("http://{}", rest), true),
            None => (raw.to_string(), false),
        };

        match Url::parse(&candidate) {
            Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Self {
                scheme: (!relative_scheme).then(|| url.scheme().to_string()),
                host: url.host_str().map(str::to_string),
                port: url.port(),
                path: decode(url.path()),
                query: url.query().map(str::to_string),
                fragment: url.fragment().map(str::to_string),
            },
            _ => Self::bare_path(raw),
        }
    }

    fn bare_path(raw: &str) -> Self {
        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (raw, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (rest, None),
        };
        Self {
            path: decode(path),
            query,
            fragment,
            ..Self::default()
        }
    }
}

/// The URL fields persisted with every record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub base_url: String,
    pub url_path: String,
    pub full_url: String,
}

/// Derive `base_url`, `url_path` and `full_url` from a raw URL
///
/// # Examples
/// ```
/// use linkstats::normalize::normalize_url;
///
/// let url = normalize_url(Some("https://Basalam.com/Cart?x=1"));
/// assert_eq!(url.base_url, "basalam.com");
/// assert_eq!(url.url_path, "cart");
/// assert_eq!(url.full_url, "https://Basalam.com/Cart?x=1");
/// ```
#[must_use]
pub fn normalize_url(raw: Option<&str>) -> NormalizedUrl {
    let Some(raw) = raw else {
        return NormalizedUrl::default();
    };

    let parts = UrlParts::parse(raw);
    let (base_url, url_path) = match &parts.host {
        Some(host) => (canonical(host), canonical(&parts.path)),
        None => (canonical(&parts.path), String::new()),
    };

    NormalizedUrl {
        base_url,
        url_path,
        full_url: raw.to_string(),
    }
}

fn canonical(value: &str) -> String {
    value.trim_matches(is_trimmed).to_lowercase()
}

fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_https_with_query() {
        let url = normalize_url(Some("https://Basalam.com/Cart?x=1"));
        assert_eq!(url.base_url, "basalam.com");
        assert_eq!(url.url_path, "cart");
        assert_eq!(url.full_url, "https://Basalam.com/Cart?x=1");
    }

    #[test]
    fn test_parts() {
        let parts = UrlParts::parse("https://shop.example.com:8443/a/b?q=1#top");
        assert_eq!(parts.scheme.as_deref(), Some("https"));
        assert_eq!(parts.host.as_deref(), Some("shop.example.com"));
        assert_eq!(parts.port, Some(8443));
        assert_eq!(parts.path, "/a/b");
        assert_eq!(parts.query.as_deref(), Some("q=1"));
        assert_eq!(parts.fragment.as_deref(), Some("top"));
    }

    #[test]
    fn test_nested_path_keeps_inner_slashes() {
        let url = normalize_url(Some("http://example.com/Products/Shoes/"));
        assert_eq!(url.base_url, "example.com");
        assert_eq!(url.url_path, "products/shoes");
    }

    #[test]
    fn test_root_path_is_empty() {
        let url = normalize_url(Some("https://basalam.com/"));
        assert_eq!(url.base_url, "basalam.com");
        assert_eq!(url.url_path, "");
    }

    #[test]
    fn test_bare_path_falls_back_to_base() {
        let url = normalize_url(Some("/Some/Page?ref=mail#x"));
        assert_eq!(url.base_url, "some/page");
        assert_eq!(url.url_path, "");
        assert_eq!(url.full_url, "/Some/Page?ref=mail#x");
    }

    #[test]
    fn test_schemeless_host_is_a_path() {
        let url = normalize_url(Some("basalam.com/cart"));
        assert_eq!(url.base_url, "basalam.com/cart");
        assert_eq!(url.url_path, "");
    }

    #[test]
    fn test_protocol_relative() {
        let parts = UrlParts::parse("//CDN.example.com/img/Logo.png");
        assert_eq!(parts.scheme, None);
        assert_eq!(parts.host.as_deref(), Some("cdn.example.com"));

        let url = normalize_url(Some("//CDN.example.com/img/Logo.png"));
        assert_eq!(url.base_url, "cdn.example.com");
        assert_eq!(url.url_path, "img/logo.png");
    }

    #[test]
    fn test_percent_encoded_path_decoded() {
        let url = normalize_url(Some("https://example.com/%D8%B3%D9%84%D8%A7%D9%85/Caf%C3%A9"));
        assert_eq!(url.url_path, "سلام/café");
    }

    #[test]
    fn test_empty_and_missing() {
        assert_eq!(normalize_url(None), NormalizedUrl::default());
        let url = normalize_url(Some(""));
        assert_eq!(url.base_url, "");
        assert_eq!(url.url_path, "");
        assert_eq!(url.full_url, "");
    }

    #[test]
    fn test_whitespace_and_zero_width_trimmed() {
        let url = normalize_url(Some("  https://example.com/\u{200C}Deals\u{200D}/  "));
        assert_eq!(url.base_url, "example.com");
        assert_eq!(url.url_path, "deals");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("ééé", 2), "éé");
    }

    proptest! {
        #[test]
        fn prop_full_url_is_untouched(raw in ".*") {
            let url = normalize_url(Some(&raw));
            prop_assert_eq!(url.full_url, raw);
        }

        #[test]
        fn prop_derived_fields_are_canonical(raw in "[ -~]{0,200}") {
            let url = normalize_url(Some(&raw));
            for field in [&url.base_url, &url.url_path] {
                prop_assert_eq!(field.to_lowercase(), field.clone());
                prop_assert!(!field.starts_with('/') && !field.ends_with('/'));
            }
        }

        #[test]
        fn prop_http_urls_have_host(host in "[a-z]{1,12}\\.(com|ir|org)", path in "(/[A-Za-z0-9]{1,8}){0,4}") {
            let url = normalize_url(Some(&format!("https://{host}{path}")));
            prop_assert_eq!(url.base_url, host);
            prop_assert_eq!(url.url_path, path.trim_matches('/').to_lowercase());
        }
    }
}
