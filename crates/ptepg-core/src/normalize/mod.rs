//! Raw records → canonical guide.
//!
//! [`normalize`] runs in three passes over the collected batches:
//!
//! 1. Channels: service ids become canonical ids, internal ids become
//!    aliases, icons and numbers are resolved.
//! 2. Programs: channel references, titles, timestamps, horizon and episode
//!    numbers are validated; survivors are deduplicated by [`ProgramKey`].
//! 3. Schedule: open-ended programs are closed, empty days receive a
//!    whole-day placeholder, and everything is ordered.
//!
//! Per-record problems never abort the run. They are logged and counted in
//! the returned [`NormalizeReport`].

mod channel;
mod program;
mod schedule;
pub mod text;
pub mod time;

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use self::channel::{ChannelTable, normalize_channel};
use self::program::{Slot, normalize_program};
use self::schedule::{TimedEntry, WholeDays, assemble};
use crate::model::{Guide, Horizon, ProgramKey};
use crate::raw::RawBatch;
use crate::report::{NormalizeReport, RecordOutcome, SkipReason};

/// Icon used for channels without a usable logo.
pub const DEFAULT_ICON_URL: &str = "https://www.meo.pt/favicon.ico";

/// Default provider timezone.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Lisbon;

/// Text of synthesized whole-day placeholder programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderText {
    /// Prepended to the channel name to form the title.
    pub title_prefix: String,
    /// Description of every placeholder.
    pub description: String,
}

impl Default for PlaceholderText {
    fn default() -> Self {
        Self {
            title_prefix: String::from("Ver"),
            description: String::from("Consulte a programação em www.meo.pt"),
        }
    }
}

/// Settings of one normalization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Days covered by the guide.
    pub horizon: Horizon,
    /// Timezone of naive provider timestamps.
    pub timezone: Tz,
    /// Fallback channel icon.
    pub default_icon: Url,
    /// Placeholder program text.
    pub placeholder: PlaceholderText,
}

impl NormalizeOptions {
    /// Creates options with the default timezone and placeholder text.
    #[must_use]
    pub fn new(horizon: Horizon, default_icon: Url) -> Self {
        Self {
            horizon,
            timezone: DEFAULT_TIMEZONE,
            default_icon,
            placeholder: PlaceholderText::default(),
        }
    }
}

/// Normalizes collected batches into a [`Guide`].
///
/// Batches and the records inside them are processed in order; when two
/// records share a key the later one wins.
///
/// # Errors
///
/// Returns an error if no channel survives normalization.
#[instrument(skip_all, fields(batches = batches.len()))]
pub fn normalize(
    batches: &[RawBatch],
    options: &NormalizeOptions,
) -> Result<(Guide, NormalizeReport)> {
    let mut report = NormalizeReport::default();

    for record in batches.iter().flat_map(|batch| &batch.malformed) {
        tracing::warn!(
            kind = %record.kind,
            index = record.index,
            error = %record.error,
            "skipping undecodable record"
        );
        report.record_skip(SkipReason::MalformedRecord);
    }

    let table = collect_channels(batches, options, &mut report);
    if table.is_empty() {
        bail!("no channels after normalization; check the configured sources");
    }

    let mut timed: BTreeMap<ProgramKey, TimedEntry> = BTreeMap::new();
    let mut whole_days = WholeDays::new();

    for batch in batches {
        for raw in &batch.programs {
            let candidate = match normalize_program(raw, batch.title_style, &table, options) {
                RecordOutcome::Accepted(candidate) => candidate,
                RecordOutcome::Skipped(reason) => {
                    log_skip(reason, raw.channel.as_deref(), raw.title.as_deref());
                    report.record_skip(reason);
                    continue;
                }
            };

            if candidate.dropped_episode_number {
                tracing::warn!(
                    channel = %candidate.channel_id,
                    title = %candidate.details.title,
                    season = ?raw.season,
                    episode = ?raw.episode,
                    "season/episode is not a valid pair, dropping it"
                );
                report.lone_episode_numbers = report.lone_episode_numbers.saturating_add(1);
            }

            let replaced = match candidate.slot {
                Slot::Timed { start, stop } => timed
                    .insert(
                        ProgramKey {
                            channel_id: candidate.channel_id,
                            start,
                        },
                        TimedEntry {
                            stop,
                            details: candidate.details,
                        },
                    )
                    .is_some(),
                Slot::WholeDay(day) => whole_days
                    .insert((candidate.channel_id, day), candidate.details)
                    .is_some(),
            };
            if replaced {
                report.duplicates = report.duplicates.saturating_add(1);
            }
        }
    }

    let channels = table.into_display_order();
    let programs = assemble(
        &channels,
        timed,
        whole_days,
        &options.horizon,
        &options.placeholder,
        &mut report,
    );
    report.channels = channels.len();

    tracing::debug!(
        channels = report.channels,
        programs = report.programs,
        placeholders = report.placeholders,
        duplicates = report.duplicates,
        skipped = report.total_skipped(),
        "normalization finished"
    );

    Ok((Guide { channels, programs }, report))
}

/// First pass: builds the channel table.
fn collect_channels(
    batches: &[RawBatch],
    options: &NormalizeOptions,
    report: &mut NormalizeReport,
) -> ChannelTable {
    let mut table = ChannelTable::default();

    for raw in batches.iter().flat_map(|batch| &batch.channels) {
        match normalize_channel(raw, &options.default_icon) {
            RecordOutcome::Accepted(resolved) => {
                let id = resolved.channel.id.clone();
                if table.insert(resolved) {
                    tracing::warn!(channel = %id, "duplicate channel record, keeping the later one");
                    report.duplicates = report.duplicates.saturating_add(1);
                }
            }
            RecordOutcome::Skipped(reason) => {
                log_skip(reason, raw.channel_id.as_deref(), raw.name.as_deref());
                report.record_skip(reason);
            }
        }
    }

    tracing::debug!(channels = table.len(), "channel lineup resolved");
    table
}

fn log_skip(reason: SkipReason, channel: Option<&str>, title: Option<&str>) {
    let channel = channel.unwrap_or_default();
    let title = title.unwrap_or_default();
    match reason {
        SkipReason::OutsideHorizon | SkipReason::SupersededByTimedSchedule => {
            tracing::debug!(%reason, channel, title, "skipping record");
        }
        _ => tracing::warn!(%reason, channel, title, "skipping record"),
    }
}
