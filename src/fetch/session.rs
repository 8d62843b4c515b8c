//! Per-invocation session state: cookie jar, fixed client identity, transport.

use std::collections::BTreeMap;

use rand::Rng;

use crate::fetch::transport::Transport;
use crate::profile::ClientIdentity;

/// Cookies injected on every product request (locale preferences).
const LOCALE_COOKIES: &[(&str, &str)] = &[("i18n-prefs", "USD"), ("lc-main", "en_US")];

/// Session cookies synthesized when the warm-up did not produce them, with
/// the numeric prefix each one carries on the real site.
const SESSION_COOKIES: &[(&str, u32)] = &[("session-id", 142), ("ubid-main", 133)];

/// Cookie name → value mapping, ordered for deterministic `Cookie` headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    /// Empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `Cookie` request-header value (`a=1; b=2`).
    ///
    /// Pairs without `=` or with an empty name are skipped.
    pub fn parse_header(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect();
        Self { cookies }
    }

    /// Renders the jar as a `Cookie` request-header value.
    pub fn to_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Sets a cookie, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Value of cookie `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Whether cookie `name` is set.
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// Number of cookies.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Whether the jar holds no cookies.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Name/value pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Copies every cookie of `other` into this jar, overwriting same names.
    pub fn merge(&mut self, other: &CookieJar) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    /// Returns the cookies to send with a product request.
    ///
    /// Locale cookies are always set. Session cookies are synthesized in the
    /// site's `NNN-NNNNNNN-NNNNNNN` shape only when absent, so a request made
    /// after a failed warm-up still looks like part of a session. The flag is
    /// `true` when at least one session cookie had to be synthesized.
    pub fn with_synthetic_defaults<R: Rng + ?Sized>(&self, rng: &mut R) -> (CookieJar, bool) {
        let mut jar = self.clone();
        for (name, value) in LOCALE_COOKIES {
            jar.insert(*name, *value);
        }

        let mut injected = false;
        for (name, prefix) in SESSION_COOKIES {
            if !jar.contains(name) {
                let value = format!(
                    "{prefix}-{}-{}",
                    rng.random_range(1_000_000..=9_999_999u32),
                    rng.random_range(1_000_000..=9_999_999u32)
                );
                jar.insert(*name, value);
                injected = true;
            }
        }
        (jar, injected)
    }
}

/// Mutable state scoped to one `fetch` invocation.
///
/// Holds the cookie jar seeded by the warm-up, the client identity chosen
/// for the whole invocation, and the transport (one persistent client).
/// Never shared across invocations; dropped when the fetch returns.
pub struct Session {
    /// Identity fixed for the invocation
    pub identity: ClientIdentity,
    /// Cookies seeded by the warm-up
    pub cookies: CookieJar,
    /// Persistent client for every request
    pub transport: Box<dyn Transport>,
}

impl Session {
    /// Bundles the session parts.
    pub fn new(identity: ClientIdentity, cookies: CookieJar, transport: Box<dyn Transport>) -> Self {
        Self {
            identity,
            cookies,
            transport,
        }
    }

    /// Folds cookies the transport accumulated for `url` into the session jar.
    pub fn absorb_cookies(&mut self, url: &str) {
        let collected = self.transport.cookies(url);
        self.cookies.merge(&collected);
    }
}
