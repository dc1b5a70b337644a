//! `FeedCollector` - raw-record JSON feeds from a file or an HTTP(S) URL.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use ptepg_core::{Horizon, RawBatch, TitleStyle};
use reqwest::Client;
use tracing::instrument;
use url::Url;

use crate::api::Collector;

/// Maximum number of retries for HTTP feeds.
const MAX_RETRIES: u32 = 3;

/// Default delay between retries.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Default User-Agent.
const DEFAULT_USER_AGENT: &str = concat!("ptepg/", env!("CARGO_PKG_VERSION"));

/// Where a feed document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLocation {
    /// Local file.
    File(PathBuf),
    /// `http`/`https` URL.
    Http(Url),
}

impl FromStr for FeedLocation {
    type Err = anyhow::Error;

    /// Parses `http(s)://` and `file://` URLs; anything else is a path.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("feed location is empty");
        }
        match Url::parse(s) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Http(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::File)
                .map_err(|()| anyhow::anyhow!("invalid file URL: {s}")),
            _ => Ok(Self::File(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for FeedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Http(url) => write!(f, "{url}"),
        }
    }
}

/// JSON feed collector.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct FeedCollector {
    /// Feed document location.
    location: FeedLocation,
    /// HTTP client (reqwest, gzip enabled).
    http_client: Client,
    /// Overrides the title style declared by the document.
    title_style: Option<TitleStyle>,
    /// Delay between HTTP retries.
    retry_delay: Duration,
}

/// Builder for `FeedCollector`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct FeedCollectorBuilder {
    location: Option<FeedLocation>,
    user_agent: Option<String>,
    title_style: Option<TitleStyle>,
    retry_delay: Option<Duration>,
}

impl FeedCollectorBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            location: None,
            user_agent: None,
            title_style: None,
            retry_delay: None,
        }
    }

    /// Sets the feed location (required).
    #[must_use]
    pub fn location(mut self, location: FeedLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Sets the User-Agent (default: `ptepg/<version>`).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Overrides the document's title style.
    #[must_use]
    pub const fn title_style(mut self, style: TitleStyle) -> Self {
        self.title_style = Some(style);
        self
    }

    /// Sets the delay between HTTP retries (default: 2s).
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Builds the collector.
    ///
    /// # Errors
    ///
    /// - `location` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<FeedCollector> {
        let location = self.location.context("location is required")?;
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| String::from(DEFAULT_USER_AGENT));

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(FeedCollector {
            location,
            http_client,
            title_style: self.title_style,
            retry_delay: self.retry_delay.unwrap_or(RETRY_DELAY),
        })
    }
}

impl FeedCollector {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> FeedCollectorBuilder {
        FeedCollectorBuilder::new()
    }

    /// Feed document location.
    #[must_use]
    pub const fn location(&self) -> &FeedLocation {
        &self.location
    }

    /// Parses a feed document.
    pub(crate) fn parse_batch(json: &str, source: &str) -> Result<RawBatch> {
        serde_json::from_str(json).with_context(|| {
            let preview = json.get(..json.floor_char_boundary(200)).unwrap_or_default();
            format!(
                "{source}: JSON decoding failed (len={}): {preview}",
                json.len()
            )
        })
    }

    /// Reads a local feed. Failures are not retried.
    async fn read_file(path: &Path) -> Result<RawBatch> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read feed {}", path.display()))?;
        Self::parse_batch(&json, &path.display().to_string())
    }

    /// Fetches an HTTP feed with retry logic.
    ///
    /// Retries up to `MAX_RETRIES` times on transport errors, non-success
    /// status codes and undecodable bodies. Logs warnings on each retry.
    async fn fetch_with_retry(&self, url: &Url) -> Result<RawBatch> {
        let mut last_err = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = match self.http_client.get(url.clone()).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(%url, attempt, error = %e, "Request failed, will retry");
                    last_err = Some(anyhow::Error::new(e).context(format!("{url} request failed")));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                tracing::warn!(%url, attempt, code = status.as_u16(), "Unexpected status, will retry");
                last_err = Some(anyhow::anyhow!("{url} returned HTTP {status}"));
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(%url, attempt, error = %e, "Failed to read response body, will retry");
                    last_err = Some(
                        anyhow::Error::new(e).context(format!("failed to read {url} response")),
                    );
                    continue;
                }
            };

            tracing::debug!(%url, body_len = body.len(), "Response body received");

            match Self::parse_batch(&body, url.as_str()) {
                Ok(batch) => return Ok(batch),
                Err(e) => {
                    tracing::warn!(%url, attempt, error = %e, "Decode error, will retry");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{url} failed after retries")))
    }
}

impl Collector for FeedCollector {
    fn name(&self) -> &str {
        match self.location {
            FeedLocation::File(_) => "file-feed",
            FeedLocation::Http(_) => "http-feed",
        }
    }

    #[instrument(skip_all, fields(location = %self.location))]
    async fn collect(&self, horizon: &Horizon) -> Result<RawBatch> {
        let mut batch = match &self.location {
            FeedLocation::File(path) => Self::read_file(path).await?,
            FeedLocation::Http(url) => self.fetch_with_retry(url).await?,
        };

        if let Some(style) = self.title_style {
            batch.title_style = style;
        }

        tracing::debug!(
            channels = batch.channels.len(),
            programs = batch.programs.len(),
            malformed = batch.malformed.len(),
            first_day = %horizon.first_day(),
            "feed collected"
        );
        Ok(batch)
    }
}
