//! Built-in pool of realistic browser profiles.

use super::{BrowserFamily, ClientHints, ClientIdentity, Platform, RequestProfile};

const CHROMIUM_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const FIREFOX_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const SAFARI_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const FIREFOX_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

fn chrome(tag: &str, major: u32, platform: Platform, user_agent: String) -> RequestProfile {
    RequestProfile {
        user_agent,
        accept: CHROMIUM_ACCEPT.to_string(),
        accept_language: ACCEPT_LANGUAGE.to_string(),
        client_hints: Some(ClientHints {
            brands: format!(
                "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"{major}\", \"Google Chrome\";v=\"{major}\""
            ),
            mobile: "?0".to_string(),
            platform: platform.client_hint().to_string(),
        }),
        identity: ClientIdentity::new(tag, BrowserFamily::Chrome, platform),
    }
}

/// Returns the default profile pool.
///
/// Covers Chrome on Windows, macOS and Linux, Firefox on Windows, and Safari
/// on iOS, matching the client identities the session layer rotates through.
pub fn default_pool() -> Vec<RequestProfile> {
    vec![
        chrome(
            "chrome_120",
            120,
            Platform::Windows,
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        ),
        chrome(
            "chrome_119",
            119,
            Platform::Windows,
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
        ),
        chrome(
            "chrome_120",
            120,
            Platform::MacOs,
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        ),
        chrome(
            "chrome_118",
            118,
            Platform::Linux,
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36".to_string(),
        ),
        RequestProfile {
            user_agent:
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0"
                    .to_string(),
            accept: FIREFOX_ACCEPT.to_string(),
            accept_language: FIREFOX_ACCEPT_LANGUAGE.to_string(),
            client_hints: None,
            identity: ClientIdentity::new("firefox_120", BrowserFamily::Firefox, Platform::Windows),
        },
        RequestProfile {
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 16_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Mobile/15E148 Safari/604.1".to_string(),
            accept: SAFARI_ACCEPT.to_string(),
            accept_language: ACCEPT_LANGUAGE.to_string(),
            client_hints: None,
            identity: ClientIdentity::new("safari_ios_16_5", BrowserFamily::Safari, Platform::Ios),
        },
    ]
}
