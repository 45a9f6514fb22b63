//! Maps raw request URLs to stable grouping patterns.
//!
//! URLs issued during a load test differ from one call to the next only in the
//! environment's host name and in per-entity identifiers. Replacing both with fixed
//! placeholders collapses calls to the same logical endpoint into one group:
//! ```text
//! https://svc-a.com/api/v1/patients/11111111-1111-1111-1111-111111111111
//! https://svc-b.com/api/v1/patients/22222222-2222-2222-2222-222222222222
//!   => https://{PLACEHOLDER}/api/v1/patients/{GUID}
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

use crate::HttpAggError;

/// Default top level domain identifying the service host in a URL.
pub const DEFAULT_HOST_SUFFIX: &str = ".com";

/// Default placeholder substituted for the service host.
pub const DEFAULT_HOST_PLACEHOLDER: &str = "{PLACEHOLDER}";

/// Default placeholder substituted for GUIDs and unresolved identifiers.
pub const DEFAULT_GUID_PLACEHOLDER: &str = "{GUID}";

/// Appended to URLs shortened to the configured maximum length.
pub const ELLIPSIS: &str = "...";

// Characters that end a host: the start of a path, query, fragment or port.
const HOST_END: &[char] = &['/', '?', '#', ':'];

lazy_static! {
    // Canonical 8-4-4-4-12 GUID, plus the literal "undefined" left behind by a client
    // that never resolved an identifier.
    static ref GUID: Regex = Regex::new(
        r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}|undefined"
    )
    .expect("failed to compile GUID regex");
}

/// Picks a host placeholder for URLs containing `marker`.
#[derive(Debug, Clone, PartialEq)]
pub struct HostRule {
    /// Substring that selects this rule, for example `widget`.
    pub marker: String,
    /// Placeholder used for the host of matching URLs.
    pub placeholder: String,
}

/// Replaces volatile URL segments with fixed placeholders.
#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    host: Regex,
    host_placeholder: String,
    host_rules: Vec<HostRule>,
    guid_placeholder: String,
    max_length: Option<usize>,
}

impl Default for KeyNormalizer {
    fn default() -> Self {
        KeyNormalizer::new(
            DEFAULT_HOST_SUFFIX,
            DEFAULT_HOST_PLACEHOLDER,
            DEFAULT_GUID_PLACEHOLDER,
        )
        .expect("default normalizer configuration is valid")
    }
}

impl KeyNormalizer {
    /// Build a normalizer recognizing hosts that end in `host_suffix`.
    ///
    /// Placeholders that would themselves be rewritten by a later pass are rejected, so
    /// normalizing an already normalized URL never changes it.
    pub fn new(
        host_suffix: &str,
        host_placeholder: &str,
        guid_placeholder: &str,
    ) -> Result<Self, HttpAggError> {
        if host_suffix.is_empty()
            || host_suffix.contains(HOST_END)
            || host_suffix.chars().any(char::is_whitespace)
        {
            return Err(HttpAggError::InvalidOption {
                option: "--host-suffix".to_string(),
                value: host_suffix.to_string(),
                detail: "host suffix must be non-empty, without whitespace, '/', '?', '#' or ':'"
                    .to_string(),
            });
        }
        // The host is a maximal run of non-whitespace characters ending in the suffix, and
        // the suffix must end the host: `.com` doesn't match inside `.company`. Slashes are
        // excluded so the scheme and path survive substitution. Only the first group is
        // replaced, the character ending the host is kept.
        let host = Regex::new(&format!(
            r"([^\s/]*{})(?:$|[/?#:\s])",
            regex::escape(host_suffix)
        ))?;

        let normalizer = KeyNormalizer {
            host,
            host_placeholder: host_placeholder.to_string(),
            host_rules: Vec::new(),
            guid_placeholder: guid_placeholder.to_string(),
            max_length: None,
        };
        normalizer.validate_placeholder("--host-placeholder", host_placeholder)?;
        normalizer.validate_placeholder("--guid-placeholder", guid_placeholder)?;

        Ok(normalizer)
    }

    /// Truncate normalized URLs longer than `max_length` characters.
    pub fn set_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    /// Add a content-sensitive host placeholder. Rules are checked in the order they are
    /// added, the first rule whose marker appears in the URL wins.
    pub fn add_host_rule(mut self, marker: &str, placeholder: &str) -> Result<Self, HttpAggError> {
        self.validate_placeholder("host rule", placeholder)?;
        self.host_rules.push(HostRule {
            marker: marker.to_string(),
            placeholder: placeholder.to_string(),
        });
        Ok(self)
    }

    // Placeholders must survive another pass through the normalizer untouched, and must
    // not combine with neighboring characters into a new host, GUID or "undefined".
    fn validate_placeholder(&self, option: &str, placeholder: &str) -> Result<(), HttpAggError> {
        let joins_neighbors = |c: Option<char>| match c {
            Some(c) => c.is_ascii_alphanumeric() || c == '-',
            None => true,
        };
        // A placeholder starting with '/', ':', etc. would end a host left of it.
        let ends_host = |c: Option<char>| {
            c.map_or(false, |c| HOST_END.contains(&c) || c.is_whitespace())
        };
        if joins_neighbors(placeholder.chars().next())
            || joins_neighbors(placeholder.chars().last())
            || ends_host(placeholder.chars().next())
            || placeholder.contains('.')
            || self.host.is_match(placeholder)
            || GUID.is_match(placeholder)
        {
            return Err(HttpAggError::InvalidOption {
                option: option.to_string(),
                value: placeholder.to_string(),
                detail: "placeholder must not contain '.', start or end with a letter, digit or '-', start with '/', '?', '#' or ':', or look like a host or GUID"
                    .to_string(),
            });
        }
        Ok(())
    }

    // Already normalized, the first host was replaced by an earlier pass.
    fn has_host_placeholder(&self, url: &str) -> bool {
        url.contains(&self.host_placeholder)
            || self
                .host_rules
                .iter()
                .any(|rule| url.contains(&rule.placeholder))
    }

    /// Choose the placeholder for the host of `url`.
    fn host_placeholder(&self, url: &str) -> &str {
        self.host_rules
            .iter()
            .find(|rule| url.contains(&rule.marker))
            .map(|rule| rule.placeholder.as_str())
            .unwrap_or(self.host_placeholder.as_str())
    }

    /// Map a raw request URL to its grouping pattern.
    pub fn normalize(&self, url: &str) -> String {
        let host = self.host.captures(url).and_then(|captures| captures.get(1));
        let without_host = match host {
            Some(host) if !self.has_host_placeholder(url) => Cow::Owned(format!(
                "{}{}{}",
                &url[..host.start()],
                self.host_placeholder(url),
                &url[host.end()..]
            )),
            _ => Cow::Borrowed(url),
        };
        let mut normalized = GUID
            .replace_all(&without_host, regex::NoExpand(&self.guid_placeholder))
            .into_owned();

        if let Some(max_length) = self.max_length {
            if let Some((cut, _)) = normalized.char_indices().nth(max_length) {
                normalized.truncate(cut);
                normalized.push_str(ELLIPSIS);
            }
        }
        trace!("normalized {} to {}", url, normalized);

        normalized
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PATIENT: &str =
        "https://svc-a.com/api/v1/patients/11111111-1111-1111-1111-111111111111";

    #[test]
    fn replaces_host_and_guid() {
        let normalizer = KeyNormalizer::default();
        assert_eq!(
            normalizer.normalize(PATIENT),
            "https://{PLACEHOLDER}/api/v1/patients/{GUID}"
        );
        // Different environment and identifier, same pattern.
        assert_eq!(
            normalizer.normalize(
                "https://svc-b.staging.com/api/v1/patients/ABCDEF01-2345-6789-abcd-ef0123456789"
            ),
            "https://{PLACEHOLDER}/api/v1/patients/{GUID}"
        );
    }

    #[test]
    fn replaces_every_guid() {
        let normalizer = KeyNormalizer::default();
        assert_eq!(
            normalizer.normalize(
                "https://svc-a.com/p/11111111-1111-1111-1111-111111111111/n/22222222-2222-2222-2222-222222222222?x=undefined"
            ),
            "https://{PLACEHOLDER}/p/{GUID}/n/{GUID}?x={GUID}"
        );
        // "undefined" is an unresolved identifier.
        assert_eq!(
            normalizer.normalize("https://svc-a.com/api/v1/patients/undefined/notes"),
            "https://{PLACEHOLDER}/api/v1/patients/{GUID}/notes"
        );
    }

    #[test]
    fn replaces_first_host_only() {
        let normalizer = KeyNormalizer::default();
        assert_eq!(
            normalizer.normalize("https://svc-a.com/redirect?to=https://other.com/x"),
            "https://{PLACEHOLDER}/redirect?to=https://other.com/x"
        );
        // No host matching the suffix, nothing to replace.
        assert_eq!(
            normalizer.normalize("http://127.0.0.1:8080/status"),
            "http://127.0.0.1:8080/status"
        );
    }

    #[test]
    fn suffix_ends_the_host() {
        let normalizer = KeyNormalizer::default();
        // ".com" inside a longer label isn't a host suffix.
        assert_eq!(
            normalizer.normalize("https://svc.company.io/api/x"),
            "https://svc.company.io/api/x"
        );
        assert_eq!(
            normalizer.normalize("https://api.comcast.net/v1"),
            "https://api.comcast.net/v1"
        );
        // The first host actually ending in the suffix is replaced instead.
        assert_eq!(
            normalizer.normalize("https://svc.company.io/go?to=https://svc-a.com/x"),
            "https://svc.company.io/go?to=https://{PLACEHOLDER}/x"
        );
        // Ports, queries and fragments survive, as does a host ending the URL.
        assert_eq!(
            normalizer.normalize("https://svc-a.com:8443/x"),
            "https://{PLACEHOLDER}:8443/x"
        );
        assert_eq!(
            normalizer.normalize("https://svc-a.com?q=1"),
            "https://{PLACEHOLDER}?q=1"
        );
        assert_eq!(
            normalizer.normalize("https://svc-a.com#top"),
            "https://{PLACEHOLDER}#top"
        );
        assert_eq!(normalizer.normalize("https://svc-a.com"), "https://{PLACEHOLDER}");
    }

    #[test]
    fn custom_suffix() {
        let normalizer = KeyNormalizer::new(".io", "{HOST}", "{ID}").unwrap();
        assert_eq!(
            normalizer.normalize("https://api.example.io/users/undefined"),
            "https://{HOST}/users/{ID}"
        );
        assert!(KeyNormalizer::new("", "{HOST}", "{ID}").is_err());
        assert!(KeyNormalizer::new(".c om", "{HOST}", "{ID}").is_err());
    }

    #[test]
    fn rejects_unstable_placeholders() {
        assert!(KeyNormalizer::new(".com", "example.com", "{GUID}").is_err());
        assert!(KeyNormalizer::new(".com", "{HOST}", "undefined").is_err());
        assert!(KeyNormalizer::new(".com", "{HOST}", "").is_err());
        assert!(KeyNormalizer::new(".com", "HOST", "{GUID}").is_err());
        assert!(KeyNormalizer::new(".com", "{HOST}.", "{GUID}").is_err());
        // Would end a host: "a.comundefined" becomes "a.com/ID/".
        assert!(KeyNormalizer::new(".com", "{HOST}", "/ID/").is_err());
        assert!(KeyNormalizer::new(".com", "{HOST}", ":ID}").is_err());
        assert!(KeyNormalizer::new(".com:", "{HOST}", "{GUID}").is_err());
        assert!(KeyNormalizer::default()
            .add_host_rule("widget", "widgets.com")
            .is_err());
    }

    #[test]
    fn host_rules() {
        let normalizer = KeyNormalizer::default()
            .add_host_rule("widget", "{WIDGET}")
            .unwrap()
            .add_host_rule("external", "{EXTERNAL}")
            .unwrap();
        assert_eq!(
            normalizer.normalize("https://svc-a.com/widget/config"),
            "https://{WIDGET}/widget/config"
        );
        assert_eq!(
            normalizer.normalize("https://svc-a.com/external/api/orders"),
            "https://{EXTERNAL}/external/api/orders"
        );
        // The first matching rule wins.
        assert_eq!(
            normalizer.normalize("https://svc-a.com/external/widget"),
            "https://{WIDGET}/external/widget"
        );
        // No rule matches, use the default placeholder.
        assert_eq!(
            normalizer.normalize("https://svc-a.com/api"),
            "https://{PLACEHOLDER}/api"
        );
    }

    #[test]
    fn truncates_long_urls() {
        let normalizer = KeyNormalizer::default().set_max_length(Some(20));
        assert_eq!(
            normalizer.normalize("https://svc-a.com/api/v1/patients/list"),
            "https://{PLACEHOLDER..."
        );

        // "https://{PLACEHOLDER}/ab" is exactly 24 characters, and is left alone.
        let normalizer = KeyNormalizer::default().set_max_length(Some(24));
        assert_eq!(
            normalizer.normalize("https://svc-a.com/ab"),
            "https://{PLACEHOLDER}/ab"
        );
        assert_eq!(
            normalizer.normalize("https://svc-a.com/abc"),
            "https://{PLACEHOLDER}/ab..."
        );
    }

    #[test]
    fn truncates_on_char_boundary() {
        let normalizer = KeyNormalizer::default().set_max_length(Some(3));
        assert_eq!(normalizer.normalize("/ééé/"), "/éé...");
        assert_eq!(normalizer.normalize("/éé"), "/éé");
    }

    #[test]
    fn idempotent() {
        let urls = [
            PATIENT,
            "https://svc-a.com/api/v1/patients/undefined",
            "http://127.0.0.1/",
            "https://svc-a.com/external/widget/11111111-1111-1111-1111-111111111111/",
            "https://svc-a.com/redirect?to=https://other.com/x",
            "http://a.comb/path/to/something/long",
            "https://svc.company.io/go?to=https://svc-a.com/x",
            "http://a.comundefined/x",
            "",
        ];
        for normalizer in &[
            KeyNormalizer::default(),
            KeyNormalizer::default().set_max_length(Some(12)),
            KeyNormalizer::default()
                .add_host_rule("widget", "{WIDGET}")
                .unwrap(),
        ] {
            for url in &urls {
                let once = normalizer.normalize(url);
                assert_eq!(normalizer.normalize(&once), once);
            }
        }
    }
}
