// Tomorrow.io HTTP client

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, decode_json};
use crate::tomorrow::models::{ForecastInterval, Location, TimelinesResponse, timestep_duration};
use crate::transport::{CallScope, TransportConfig};

const TIMELINES_PATH: &str = "/v4/timelines";

/// Client for the Tomorrow.io timelines API.
pub struct TomorrowClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl TomorrowClient {
    /// Production API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.tomorrow.io";

    pub fn new(
        base_url: Url,
        api_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            api_key,
        })
    }

    /// Fetch forecast intervals for `location`.
    ///
    /// `fields` are joined into the `fields` parameter; `extra_params` are
    /// appended to the query string as given. Intervals come from the most
    /// granular timeline in the reply, sorted by start time.
    pub async fn get_forecast(
        &self,
        location: &Location,
        fields: &[&str],
        extra_params: &[(&str, &str)],
        scope: &CallScope,
    ) -> Result<Vec<ForecastInterval>, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{TIMELINES_PATH}"))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("apikey", self.api_key.expose_secret())
                .append_pair("location", &location.to_string())
                .append_pair("fields", &fields.join(","));
            for (name, value) in extra_params {
                query.append_pair(name, value);
            }
        }

        // The query carries the API key; log the path only and strip the URL
        // from transport errors.
        debug!(%location, fields = %fields.join(","), "GET {}", TIMELINES_PATH);

        let (status, body) = scope
            .run(async {
                let resp = self
                    .http
                    .get(url.clone())
                    .header(ACCEPT, "application/json")
                    .send()
                    .await
                    .map_err(reqwest::Error::without_url)?;
                let status = resp.status();
                let body = resp.text().await.map_err(reqwest::Error::without_url)?;
                Ok::<_, Error>((status, body))
            })
            .await?;

        if status != StatusCode::OK {
            return Err(Error::Http {
                endpoint: format!("GET {TIMELINES_PATH}"),
                status: status.as_u16(),
                body,
            });
        }

        let response: TimelinesResponse = decode_json(&body)?;
        let timeline = response
            .data
            .timelines
            .into_iter()
            .min_by_key(|t| timestep_duration(&t.timestep).unwrap_or(std::time::Duration::MAX))
            .ok_or_else(|| Error::Deserialization {
                message: "forecast reply has no timelines".into(),
                body: body.clone(),
            })?;

        trace!(
            timestep = %timeline.timestep,
            intervals = timeline.intervals.len(),
            "selected forecast timeline"
        );

        let mut intervals = timeline
            .intervals
            .into_iter()
            .map(ForecastInterval::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        intervals.sort_by_key(|i| i.start_time);
        Ok(intervals)
    }
}
