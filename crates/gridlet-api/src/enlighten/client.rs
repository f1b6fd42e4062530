// Enlighten HTTP client
//
// Wraps two `reqwest::Client`s: one that follows redirects for ordinary
// requests, one that returns 3xx responses untouched for the login POST.
// Cookies are tracked by hand in a `CookieJar`, never by reqwest, so the
// session stays an explicit value owned by the caller.

use reqwest::header::COOKIE;
use url::Url;

use crate::cookies::CookieJar;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the Enlighten portal.
pub struct EnlightenClient {
    http: reqwest::Client,
    login_http: reqwest::Client,
    base_url: Url,
}

impl EnlightenClient {
    /// Production portal root.
    pub const DEFAULT_BASE_URL: &'static str = "https://enlighten.enphaseenergy.com";

    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            login_http: transport.build_manual_redirect_client()?,
            base_url,
        })
    }

    /// The portal base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn login_http(&self) -> &reqwest::Client {
        &self.login_http
    }

    /// Build a full URL for an absolute portal path.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// Attach the jar's `Cookie` header, if it holds anything.
    pub(crate) fn with_cookies(
        builder: reqwest::RequestBuilder,
        cookies: &CookieJar,
    ) -> reqwest::RequestBuilder {
        match cookies.header_value() {
            Some(header) => builder.header(COOKIE, header),
            None => builder,
        }
    }
}
