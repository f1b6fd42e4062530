// Battery configuration endpoints
//
// Both calls run on an already-authenticated session, so any non-200 reply
// is reported as an error rather than a rejected login.

use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::enlighten::client::EnlightenClient;
use crate::enlighten::models::{
    BatteryConfig, BatteryConfigEnvelope, BatteryConfigUpdate, BatteryMode, SESSION_COOKIE,
    Session, UpdateReply,
};
use crate::error::{Error, decode_json};
use crate::transport::CallScope;

/// Message the portal sends back when an update was applied.
pub const UPDATE_SUCCESS_MESSAGE: &str = "Battery config updated successfully";

/// Header carrying the session cookie for the settings PUT.
const AUTH_TOKEN_HEADER: &str = "e-auth-token";

impl EnlightenClient {
    /// Fetch the site's current battery configuration.
    pub async fn get_battery_config(
        &self,
        session: &Session,
        scope: &CallScope,
    ) -> Result<BatteryConfig, Error> {
        let url = self.battery_config_url(session)?;
        debug!("GET {}", url);

        let (status, body) = scope
            .run(async {
                let builder = self.http().get(url.clone());
                let resp = Self::with_cookies(builder, session.cookies()).send().await?;
                let status = resp.status();
                Ok::<_, Error>((status, resp.text().await?))
            })
            .await?;

        if status != StatusCode::OK {
            return Err(Error::Http {
                endpoint: format!("GET {}", url.path()),
                status: status.as_u16(),
                body,
            });
        }

        let envelope: BatteryConfigEnvelope = decode_json(&body)?;
        envelope.battery_config.try_into()
    }

    /// Write a new battery mode.
    ///
    /// Succeeds only on HTTP 200 with the portal's confirmation message.
    pub async fn set_battery_mode(
        &self,
        session: &Session,
        mode: &BatteryMode,
        scope: &CallScope,
    ) -> Result<(), Error> {
        let token = session
            .cookies()
            .get(SESSION_COOKIE)
            .ok_or_else(|| Error::MissingCookie {
                name: SESSION_COOKIE.into(),
            })?;

        let url = self.battery_config_url(session)?;
        let form = BatteryConfigUpdate::from(mode);
        debug!(%mode, "PUT {}", url);

        let (status, body) = scope
            .run(async {
                let builder = self
                    .http()
                    .put(url.clone())
                    .header(AUTH_TOKEN_HEADER, token)
                    .form(&form);
                let resp = Self::with_cookies(builder, session.cookies()).send().await?;
                let status = resp.status();
                Ok::<_, Error>((status, resp.text().await?))
            })
            .await?;

        if status != StatusCode::OK {
            return Err(Error::Http {
                endpoint: format!("PUT {}", url.path()),
                status: status.as_u16(),
                body,
            });
        }

        let reply: UpdateReply = decode_json(&body)?;
        match reply.message {
            Some(message) if message == UPDATE_SUCCESS_MESSAGE => {
                debug!("battery config updated");
                Ok(())
            }
            Some(message) => Err(Error::Rejected { message }),
            None => Err(Error::Rejected {
                message: format!("no message in reply: {body}"),
            }),
        }
    }

    /// `{base}/pv/settings/{site}/battery_config?source=my_enlighten`
    fn battery_config_url(&self, session: &Session) -> Result<Url, Error> {
        let mut url = self.url(&format!(
            "/pv/settings/{}/battery_config",
            session.site_id()
        ))?;
        url.query_pairs_mut().append_pair("source", "my_enlighten");
        Ok(url)
    }
}
