//! Request profile rotation.
//!
//! A [`RequestProfile`] is a mutually consistent bundle of browser identity
//! headers. The [`ProfileRotator`] draws profiles uniformly at random (with
//! replacement) so consecutive requests don't look identical, while refusing
//! to ever emit a profile whose headers contradict each other.
//!
//! The rotator holds no mutable state: randomness is supplied by the caller,
//! which keeps it `Send + Sync` and lets tests seed the draw.

mod pool;

use std::collections::HashSet;

use rand::Rng;

use crate::error_handling::ConfigError;

pub use pool::default_pool;

/// Minimum number of distinct OS/browser combinations a pool must offer.
pub const MIN_DISTINCT_PROFILES: usize = 3;

/// Browser engine family, as announced by the user-agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserFamily {
    /// Google Chrome
    Chrome,
    /// Microsoft Edge
    Edge,
    /// Mozilla Firefox
    Firefox,
    /// Apple Safari
    Safari,
}

impl BrowserFamily {
    /// Chromium-based browsers send `sec-ch-ua` client hints.
    pub fn is_chromium(&self) -> bool {
        matches!(self, BrowserFamily::Chrome | BrowserFamily::Edge)
    }

    /// Detects the browser family from a user-agent string.
    ///
    /// Order matters: Edge and Chrome user-agents both mention Safari, and
    /// Edge mentions Chrome.
    pub fn detect(user_agent: &str) -> Option<Self> {
        if user_agent.contains("Edg/") {
            Some(BrowserFamily::Edge)
        } else if user_agent.contains("Firefox/") {
            Some(BrowserFamily::Firefox)
        } else if user_agent.contains("Chrome/") || user_agent.contains("CriOS/") {
            Some(BrowserFamily::Chrome)
        } else if user_agent.contains("Safari/") && user_agent.contains("Version/") {
            Some(BrowserFamily::Safari)
        } else {
            None
        }
    }
}

/// Operating system announced by the user-agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Microsoft Windows
    Windows,
    /// Apple macOS
    MacOs,
    /// Apple iOS
    Ios,
    /// Desktop Linux
    Linux,
}

impl Platform {
    /// Detects the platform from a user-agent string.
    pub fn detect(user_agent: &str) -> Option<Self> {
        if user_agent.contains("Windows NT") {
            Some(Platform::Windows)
        } else if user_agent.contains("iPhone") || user_agent.contains("iPad") {
            Some(Platform::Ios)
        } else if user_agent.contains("Macintosh") {
            Some(Platform::MacOs)
        } else if user_agent.contains("Linux") {
            Some(Platform::Linux)
        } else {
            None
        }
    }

    /// Value of the `sec-ch-ua-platform` client hint for this platform.
    pub fn client_hint(&self) -> &'static str {
        match self {
            Platform::Windows => "\"Windows\"",
            Platform::MacOs => "\"macOS\"",
            Platform::Ios => "\"iOS\"",
            Platform::Linux => "\"Linux\"",
        }
    }
}

/// Client identity: version tag (e.g. `chrome_120`, `safari_ios_16_5`),
/// browser family and platform.
///
/// Fixed for the whole lifetime of a fetch session: switching identities
/// mid-retry is itself a block signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    /// Identity tag
    pub tag: String,
    /// Browser family the tag belongs to
    pub family: BrowserFamily,
    /// Operating system the identity runs on
    pub platform: Platform,
}

impl ClientIdentity {
    /// Creates an identity from its tag, family and platform.
    pub fn new(tag: impl Into<String>, family: BrowserFamily, platform: Platform) -> Self {
        Self {
            tag: tag.into(),
            family,
            platform,
        }
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag)
    }
}

/// Chromium `sec-ch-ua*` client hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHints {
    /// `sec-ch-ua` brand list
    pub brands: String,
    /// `sec-ch-ua-mobile` (`?0` or `?1`)
    pub mobile: String,
    /// `sec-ch-ua-platform`
    pub platform: String,
}

/// Immutable header/identity bundle used for exactly one HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestProfile {
    /// `user-agent` header
    pub user_agent: String,
    /// `accept` header
    pub accept: String,
    /// `accept-language` header
    pub accept_language: String,
    /// Client hints, Chromium only
    pub client_hints: Option<ClientHints>,
    /// Identity the profile belongs to
    pub identity: ClientIdentity,
}

impl RequestProfile {
    /// Browser family announced by the user-agent, if recognisable.
    pub fn family(&self) -> Option<BrowserFamily> {
        BrowserFamily::detect(&self.user_agent)
    }

    /// Platform announced by the user-agent, if recognisable.
    pub fn platform(&self) -> Option<Platform> {
        Platform::detect(&self.user_agent)
    }

    /// Checks that the header set does not contradict itself.
    ///
    /// # Errors
    ///
    /// Returns a description of the first inconsistency found.
    pub fn check_consistency(&self) -> Result<(), String> {
        let family = self
            .family()
            .ok_or_else(|| format!("unrecognised user-agent '{}'", self.user_agent))?;
        let platform = self
            .platform()
            .ok_or_else(|| format!("no platform in user-agent '{}'", self.user_agent))?;

        if family != self.identity.family {
            return Err(format!(
                "identity {} is {:?} but user-agent is {:?}",
                self.identity.tag, self.identity.family, family
            ));
        }
        if platform != self.identity.platform {
            return Err(format!(
                "identity {} is {:?} but user-agent is {:?}",
                self.identity.tag, self.identity.platform, platform
            ));
        }

        match (&self.client_hints, family.is_chromium()) {
            (Some(_), false) => {
                return Err(format!("{:?} user-agent with Chromium client hints", family));
            }
            (Some(hints), true) => {
                if hints.platform != platform.client_hint() {
                    return Err(format!(
                        "client hint platform {} does not match {:?} user-agent",
                        hints.platform, platform
                    ));
                }
                let mobile = if platform == Platform::Ios { "?1" } else { "?0" };
                if hints.mobile != mobile {
                    return Err(format!(
                        "client hint mobile {} does not match {:?} user-agent",
                        hints.mobile, platform
                    ));
                }
            }
            (None, _) => {}
        }

        // Signed exchanges are advertised by Chromium only.
        if self.accept.contains("signed-exchange") && !family.is_chromium() {
            return Err(format!(
                "{:?} user-agent with Chromium-only accept header",
                family
            ));
        }

        if self.accept_language.trim().is_empty() {
            return Err("empty accept-language".to_string());
        }

        Ok(())
    }

    /// Header name/value pairs carried by this profile.
    ///
    /// Navigation headers common to all modern browsers are included so the
    /// request shape matches a top-level page load. `sec-fetch-site` depends
    /// on the referer and is added per request.
    pub fn header_pairs(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("user-agent", self.user_agent.clone()),
            ("accept", self.accept.clone()),
            ("accept-language", self.accept_language.clone()),
            ("accept-encoding", "gzip, deflate, br".to_string()),
            ("upgrade-insecure-requests", "1".to_string()),
            ("sec-fetch-dest", "document".to_string()),
            ("sec-fetch-mode", "navigate".to_string()),
            ("sec-fetch-user", "?1".to_string()),
        ];
        if let Some(hints) = &self.client_hints {
            headers.push(("sec-ch-ua", hints.brands.clone()));
            headers.push(("sec-ch-ua-mobile", hints.mobile.clone()));
            headers.push(("sec-ch-ua-platform", hints.platform.clone()));
        }
        headers
    }
}

/// Uniform random selection over a fixed pool of browser profiles.
#[derive(Debug, Clone)]
pub struct ProfileRotator {
    profiles: Vec<RequestProfile>,
}

impl Default for ProfileRotator {
    /// Builds a rotator over [`default_pool`], which is covered by tests.
    fn default() -> Self {
        Self {
            profiles: default_pool(),
        }
    }
}

impl ProfileRotator {
    /// Creates a rotator over `profiles`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ProfilePool` if the pool has fewer than
    /// [`MIN_DISTINCT_PROFILES`] distinct OS/browser combinations or if any
    /// profile is internally inconsistent.
    pub fn new(profiles: Vec<RequestProfile>) -> Result<Self, ConfigError> {
        for profile in &profiles {
            profile.check_consistency().map_err(|reason| {
                ConfigError::ProfilePool(format!("{}: {}", profile.identity.tag, reason))
            })?;
        }

        let distinct: HashSet<(Option<Platform>, Option<BrowserFamily>)> = profiles
            .iter()
            .map(|p| (p.platform(), p.family()))
            .collect();
        if distinct.len() < MIN_DISTINCT_PROFILES {
            return Err(ConfigError::ProfilePool(format!(
                "{} distinct OS/browser combinations, at least {} required",
                distinct.len(),
                MIN_DISTINCT_PROFILES
            )));
        }

        Ok(Self { profiles })
    }

    /// All profiles in the pool.
    pub fn profiles(&self) -> &[RequestProfile] {
        &self.profiles
    }

    /// Uniform draw, with replacement, from the whole pool.
    pub fn next_profile<R: Rng + ?Sized>(&self, rng: &mut R) -> &RequestProfile {
        &self.profiles[rng.random_range(0..self.profiles.len())]
    }

    /// Draws the client identity for a new session.
    pub fn next_identity<R: Rng + ?Sized>(&self, rng: &mut R) -> ClientIdentity {
        self.next_profile(rng).identity.clone()
    }

    /// Uniform draw among profiles carrying the session identity.
    ///
    /// Keeps browser, version and platform stable across the attempts of one
    /// session; pools with several profiles per identity still vary the
    /// remaining headers. Falls back to the whole pool if no profile carries
    /// the identity.
    pub fn next_profile_for<R: Rng + ?Sized>(
        &self,
        identity: &ClientIdentity,
        rng: &mut R,
    ) -> &RequestProfile {
        let candidates: Vec<&RequestProfile> = self
            .profiles
            .iter()
            .filter(|p| p.identity == *identity)
            .collect();
        if candidates.is_empty() {
            return self.next_profile(rng);
        }
        candidates[rng.random_range(0..candidates.len())]
    }
}
