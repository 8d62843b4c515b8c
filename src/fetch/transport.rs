//! HTTP transport seam.
//!
//! The fetch loop talks to the network only through [`Connector`] (opens one
//! session-scoped client for a client identity) and [`Transport`] (issues GET
//! requests on that client and exposes the cookies it accumulated). The
//! production implementation wraps `reqwest` with a private cookie store per
//! session; tests substitute scripted implementations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};

use crate::error_handling::{categorize_reqwest_error, TransportError};
use crate::fetch::session::CookieJar;
use crate::initialization::build_session_client;
use crate::profile::{ClientIdentity, RequestProfile};

/// One GET request: URL, header profile, cookies to send, optional referer.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Absolute URL
    pub url: String,
    /// Header profile for this call
    pub profile: RequestProfile,
    /// Cookies to send
    pub cookies: CookieJar,
    /// Previous page, if any
    pub referer: Option<String>,
}

impl PageRequest {
    /// Every header to send: the profile's, then `sec-fetch-site` and the
    /// referer.
    pub fn header_pairs(&self) -> Vec<(&'static str, String)> {
        let mut headers = self.profile.header_pairs();
        headers.push(("sec-fetch-site", self.fetch_site().to_string()));
        if let Some(referer) = &self.referer {
            headers.push(("referer", referer.clone()));
        }
        headers
    }

    /// `sec-fetch-site` value a browser would send for this navigation.
    ///
    /// Typed-in loads (no referer) are `none`.
    pub fn fetch_site(&self) -> &'static str {
        let Some(referer) = &self.referer else {
            return "none";
        };
        match (url::Url::parse(referer), url::Url::parse(&self.url)) {
            (Ok(from), Ok(to)) if from.origin() == to.origin() => "same-origin",
            (Ok(from), Ok(to)) if from.host_str().is_some() && from.host_str() == to.host_str() => {
                "same-site"
            }
            _ => "cross-site",
        }
    }
}

/// Raw response of one GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Decoded body
    pub body: String,
    /// URL after redirects
    pub final_url: String,
}

/// Issues requests on one persistent client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a GET request and reads the whole body.
    async fn get(&self, request: &PageRequest) -> Result<FetchedPage, TransportError>;

    /// Cookies the client currently holds for `url`.
    fn cookies(&self, url: &str) -> CookieJar;
}

/// Opens a session-scoped [`Transport`] for a client identity.
pub trait Connector: Send + Sync {
    /// Opens a transport with its own cookie store.
    fn connect(
        &self,
        identity: &ClientIdentity,
        timeout: Duration,
    ) -> Result<Box<dyn Transport>, TransportError>;
}

/// `reqwest`-backed connector.
///
/// Every call builds a fresh client with its own cookie store, so cookies
/// never leak between fetch invocations. The client identity cannot change
/// the rustls handshake; it is recorded on the transport and drives the
/// header profile selection upstream.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(
        &self,
        identity: &ClientIdentity,
        timeout: Duration,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let (client, jar) =
            build_session_client(timeout).map_err(|e| categorize_reqwest_error(&e))?;
        log::debug!("Opened HTTP session for client identity {identity}");
        Ok(Box::new(HttpTransport {
            client,
            jar,
            identity: identity.clone(),
        }))
    }
}

/// `reqwest` client plus its cookie store.
pub struct HttpTransport {
    client: reqwest::Client,
    jar: Arc<Jar>,
    identity: ClientIdentity,
}

impl HttpTransport {
    /// Client identity this transport was opened for.
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &PageRequest) -> Result<FetchedPage, TransportError> {
        let url = url::Url::parse(&request.url)
            .map_err(|e| TransportError::Builder(format!("{}: {e}", request.url)))?;

        // Seed the store rather than sending a second Cookie header.
        for (name, value) in request.cookies.iter() {
            self.jar.add_cookie_str(&format!("{name}={value}"), &url);
        }

        let mut builder = self.client.get(url);
        for (name, value) in request.header_pairs() {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;

        Ok(FetchedPage {
            status,
            body,
            final_url,
        })
    }

    fn cookies(&self, url: &str) -> CookieJar {
        let Ok(url) = url::Url::parse(url) else {
            return CookieJar::default();
        };
        self.jar
            .cookies(&url)
            .and_then(|header| header.to_str().map(CookieJar::parse_header).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::default_pool;

    fn request(url: &str, referer: Option<&str>) -> PageRequest {
        PageRequest {
            url: url.to_string(),
            profile: default_pool().remove(0),
            cookies: CookieJar::new(),
            referer: referer.map(str::to_string),
        }
    }

    fn header<'a>(headers: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_first_navigation_without_referer() {
        let first = request("https://www.amazon.com/", None);
        let headers = first.header_pairs();
        assert_eq!(header(&headers, "sec-fetch-site"), Some("none"));
        assert_eq!(header(&headers, "referer"), None);
    }

    #[test]
    fn test_navigation_within_site() {
        let next = request(
            "https://www.amazon.com/dp/B0TEST",
            Some("https://www.amazon.com/"),
        );
        let headers = next.header_pairs();
        assert_eq!(header(&headers, "sec-fetch-site"), Some("same-origin"));
        assert_eq!(header(&headers, "referer"), Some("https://www.amazon.com/"));
    }

    #[test]
    fn test_navigation_from_other_origin() {
        let from_search = request("https://www.amazon.com/dp/B0TEST", Some("https://www.google.com/"));
        assert_eq!(from_search.fetch_site(), "cross-site");
    }
}
