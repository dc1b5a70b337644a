//! `AppConfig` struct, TOML loading and validation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use ptepg_core::normalize::{DEFAULT_ICON_URL, DEFAULT_TIMEZONE};
use ptepg_core::{
    DEFAULT_HORIZON_DAYS, GeneratorInfo, Horizon, NormalizeOptions, PlaceholderText, TitleStyle,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Longest accepted horizon.
pub const MAX_HORIZON_DAYS: u32 = 31;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Guide settings.
    #[serde(default)]
    pub guide: GuideConfig,
    /// Values written on the root `tv` element.
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Text of synthesized placeholder programs.
    #[serde(default)]
    pub placeholder: PlaceholderText,
    /// Sources, collected in order.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            guide: GuideConfig::default(),
            generator: GeneratorConfig::default(),
            placeholder: PlaceholderText::default(),
            sources: default_sources(),
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![SourceConfig::Meo]
}

/// Guide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GuideConfig {
    /// Number of days covered, starting today (UTC).
    pub days: u32,
    /// Output file.
    pub output: PathBuf,
    /// Icon for channels without a usable logo.
    pub default_icon: String,
    /// IANA timezone of naive provider timestamps.
    pub timezone: String,
    /// `lang` attribute of text elements; empty disables it.
    pub language: String,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_HORIZON_DAYS,
            output: PathBuf::from("guide.xml"),
            default_icon: String::from(DEFAULT_ICON_URL),
            timezone: String::from(DEFAULT_TIMEZONE.name()),
            language: String::from("pt"),
        }
    }
}

/// Generator identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// `generator-info-name`.
    pub name: String,
    /// `generator-info-url`.
    pub url: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let info = GeneratorInfo::default();
        Self {
            name: info.name,
            url: info.url,
        }
    }
}

/// One configured source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Built-in MEO lineup.
    Meo,
    /// Raw-record JSON feed.
    Feed {
        /// Path or `http(s)` URL.
        location: String,
        /// Overrides the title style declared by the document.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title_style: Option<TitleStyle>,
    },
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Builds normalizer settings, optionally overriding the horizon length.
    ///
    /// # Errors
    ///
    /// Returns an error if the horizon length, timezone or default icon is invalid.
    pub fn normalize_options(&self, days: Option<u32>) -> Result<NormalizeOptions> {
        let days = days.unwrap_or(self.guide.days);
        if !(1..=MAX_HORIZON_DAYS).contains(&days) {
            bail!("guide.days must be between 1 and {MAX_HORIZON_DAYS}, got {days}");
        }

        let timezone: Tz = self
            .guide
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid guide.timezone {:?}: {e}", self.guide.timezone))?;

        let default_icon = Url::parse(&self.guide.default_icon)
            .with_context(|| format!("invalid guide.default_icon {:?}", self.guide.default_icon))?;
        if !matches!(default_icon.scheme(), "http" | "https") {
            bail!(
                "guide.default_icon must be an http(s) URL, got {:?}",
                self.guide.default_icon
            );
        }

        Ok(NormalizeOptions {
            horizon: Horizon::starting_today(days),
            timezone,
            default_icon,
            placeholder: self.placeholder.clone(),
        })
    }

    /// Builds the root element identity.
    #[must_use]
    pub fn generator_info(&self) -> GeneratorInfo {
        let language = self.guide.language.trim();
        GeneratorInfo {
            name: self.generator.name.clone(),
            url: self.generator.url.clone(),
            language: (!language.is_empty()).then(|| String::from(language)),
        }
    }
}
