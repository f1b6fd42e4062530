// Enlighten session authentication
//
// INIT -> BOOTSTRAPPED -> SUBMITTED -> AUTHENTICATED | FAILED
//
// GET the portal root for its cookies and login form, resubmit the form
// (hidden anti-CSRF fields included) with the credentials, and accept the
// login only if the portal answers with a 302 to the site dashboard.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::cookies::CookieJar;
use crate::enlighten::client::EnlightenClient;
use crate::enlighten::models::Session;
use crate::error::Error;
use crate::form::scrape_form_fields;
use crate::transport::CallScope;

/// Path the login form posts to; also used to pick the form out of the page.
pub const LOGIN_PATH: &str = "/login/login";

const USERNAME_FIELD: &str = "user[email]";
const PASSWORD_FIELD: &str = "user[password]";

/// Path and query of a successful login redirect.
static LOGIN_SUCCESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/web/(?P<site_id>[0-9]+)\?v=.*$").expect("login redirect pattern is valid")
});

impl EnlightenClient {
    /// Log in with username/password.
    ///
    /// Returns `Ok(None)` when the portal rejects the login (bad
    /// credentials, unexpected redirect, or no login form on the page).
    /// Transport failures, timeouts and cancellation are `Err`.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
        scope: &CallScope,
    ) -> Result<Option<Session>, Error> {
        // INIT -> BOOTSTRAPPED
        let root = self.url("/")?;
        debug!("bootstrapping session at {}", root);

        let (status, cookies, page) = scope
            .run(async {
                let resp = self.http().get(root.clone()).send().await?;
                let status = resp.status();
                let cookies = CookieJar::from_response(None, resp.headers());
                let page = resp.text().await?;
                Ok::<_, Error>((status, cookies, page))
            })
            .await?;

        if !status.is_success() {
            warn!(%status, "bootstrap page returned an error status");
        }
        debug!(cookies = cookies.len(), "bootstrapped");

        // BOOTSTRAPPED -> SUBMITTED
        let Some(form_fields) = scrape_form_fields(&page, LOGIN_PATH) else {
            debug!("login form not found on bootstrap page");
            return Ok(None);
        };

        let mut fields: IndexMap<String, String> = IndexMap::new();
        fields.insert(USERNAME_FIELD.into(), username.to_owned());
        fields.insert(PASSWORD_FIELD.into(), password.expose_secret().to_owned());
        fields.extend(form_fields);

        let login_url = self.url(LOGIN_PATH)?;
        debug!(fields = fields.len(), "submitting login form to {}", login_url);

        let (status, headers) = scope
            .run(async {
                let builder = self.login_http().post(login_url.clone()).form(&fields);
                let resp = Self::with_cookies(builder, &cookies).send().await?;
                Ok::<_, Error>((resp.status(), resp.headers().clone()))
            })
            .await?;

        // SUBMITTED -> AUTHENTICATED | FAILED
        if status != StatusCode::FOUND {
            debug!(%status, "login rejected: expected a redirect");
            return Ok(None);
        }

        let Some(location) = headers.get(LOCATION).and_then(|v| v.to_str().ok()) else {
            debug!("login rejected: redirect without a Location header");
            return Ok(None);
        };

        let Some(site_id) = self.site_id_from_location(location) else {
            debug!(location, "login rejected: unexpected redirect target");
            return Ok(None);
        };

        let cookies = CookieJar::from_response(Some(&cookies), &headers);
        debug!(%site_id, cookies = cookies.len(), "login successful");
        Ok(Some(Session::new(cookies, site_id)))
    }

    /// Extract the site id from a login redirect on the portal's own origin.
    fn site_id_from_location(&self, location: &str) -> Option<String> {
        let target = self.base_url().join(location).ok()?;
        if target.origin() != self.base_url().origin() {
            return None;
        }

        let path_and_query = match target.query() {
            Some(query) => format!("{}?{query}", target.path()),
            None => target.path().to_owned(),
        };

        LOGIN_SUCCESS_RE
            .captures(&path_and_query)
            .map(|caps| caps["site_id"].to_owned())
    }
}
