//! HTTP client for the fantasy upstream API.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use leaguesync_core::record::{SecondaryKey, SubjectId};
use leaguesync_core::upstream::{FetchError, RawRecord, UpstreamClient};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which upstream resource a client instance fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamRoute {
    /// Per-gameweek points. With a secondary key this hits the single-event
    /// endpoint; without one it hits the full season history.
    EventPoints,
    /// The entry summary carrying the current overall standing.
    EntrySummary,
}

impl UpstreamRoute {
    fn path(&self, subject: SubjectId, secondary: Option<&SecondaryKey>) -> String {
        match (self, secondary) {
            (UpstreamRoute::EventPoints, Some(event)) => {
                format!("entry/{subject}/event/{event}/points")
            }
            (UpstreamRoute::EventPoints, None) => format!("entry/{subject}/history"),
            (UpstreamRoute::EntrySummary, _) => format!("entry/{subject}"),
        }
    }
}

/// Upstream client over HTTP.
///
/// One instance per route; the transport timeout lives here, the sync
/// engine imposes none of its own.
pub struct HttpUpstream {
    http: reqwest::Client,
    base_url: Url,
    route: UpstreamRoute,
}

impl HttpUpstream {
    pub fn new(base_url: Url, route: UpstreamRoute) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            route,
        })
    }

    fn url_for(
        &self,
        subject: SubjectId,
        secondary: Option<&SecondaryKey>,
    ) -> Result<Url, FetchError> {
        self.base_url
            .join(&self.route.path(subject, secondary))
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn fetch(
        &self,
        subject: SubjectId,
        secondary: Option<&SecondaryKey>,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let url = self.url_for(subject, secondary)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(split_payload(body))
    }
}

/// Splits a response body into raw records: a JSON array becomes one record
/// per element, anything else is a single record.
fn split_payload(body: serde_json::Value) -> Vec<RawRecord> {
    match body {
        serde_json::Value::Array(items) => items.into_iter().map(RawRecord::new).collect(),
        other => vec![RawRecord::new(other)],
    }
}
