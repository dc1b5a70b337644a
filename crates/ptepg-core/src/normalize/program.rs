//! Per-record program normalization.

use chrono::{DateTime, NaiveDate, Utc};

use super::NormalizeOptions;
use super::channel::ChannelTable;
use super::text::{clean_text, release_year, split_title};
use super::time::{ParsedTime, parse_timestamp};
use crate::model::EpisodeNumber;
use crate::raw::{RawProgram, TitleStyle};
use crate::report::{RecordOutcome, SkipReason};

/// When a candidate airs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Slot {
    /// Exact start; stop may still be unknown.
    Timed {
        start: DateTime<Utc>,
        stop: Option<DateTime<Utc>>,
    },
    /// Whole calendar day (UTC).
    WholeDay(NaiveDate),
}

/// Descriptive fields shared by timed and whole-day programs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct Details {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<String>,
    pub rating: Option<String>,
    pub episode: Option<EpisodeNumber>,
}

/// A program record that passed validation but is not yet scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Candidate {
    pub channel_id: String,
    pub slot: Slot,
    pub details: Details,
    /// A season or episode value was present but unusable.
    pub dropped_episode_number: bool,
}

/// Validates one raw program against the channel table and the horizon.
pub(super) fn normalize_program(
    raw: &RawProgram,
    style: TitleStyle,
    channels: &ChannelTable,
    options: &NormalizeOptions,
) -> RecordOutcome<Candidate> {
    build_candidate(raw, style, channels, options).into()
}

fn build_candidate(
    raw: &RawProgram,
    style: TitleStyle,
    channels: &ChannelTable,
    options: &NormalizeOptions,
) -> Result<Candidate, SkipReason> {
    let reference = clean_text(raw.channel.as_deref()).ok_or(SkipReason::MissingChannelRef)?;
    let channel = channels
        .resolve(&reference)
        .ok_or(SkipReason::UnknownChannel)?;

    let (title, subtitle) = split_title(raw.title.as_deref(), raw.subtitle.as_deref(), style)
        .ok_or(SkipReason::MissingTitle)?;

    let slot = parse_slot(raw, options)?;
    let in_horizon = match slot {
        Slot::Timed { start, .. } => options.horizon.contains(start),
        Slot::WholeDay(day) => options.horizon.contains_day(day),
    };
    if !in_horizon {
        return Err(SkipReason::OutsideHorizon);
    }

    let (episode, dropped_episode_number) = episode_number(raw.season, raw.episode);

    Ok(Candidate {
        channel_id: channel.id.clone(),
        slot,
        details: Details {
            title,
            subtitle,
            description: clean_text(raw.description.as_deref()),
            genre: clean_text(raw.genre.as_deref()),
            release_year: release_year(raw.year.as_deref()),
            rating: clean_text(raw.rating.as_deref()),
            episode,
        },
        dropped_episode_number,
    })
}

/// Resolves `start`/`end`/`date` into a slot.
fn parse_slot(raw: &RawProgram, options: &NormalizeOptions) -> Result<Slot, SkipReason> {
    let tz = options.timezone;

    if let Some(start) = raw.start.as_deref() {
        return match parse_timestamp(start, tz)? {
            ParsedTime::Day(day) => Ok(Slot::WholeDay(day)),
            ParsedTime::Instant(start) => {
                let stop = match raw.end.as_deref() {
                    None => None,
                    Some(end) => match parse_timestamp(end, tz)? {
                        ParsedTime::Instant(stop) => Some(stop),
                        ParsedTime::Day(_) => return Err(SkipReason::InvalidTimestamp),
                    },
                };
                if stop.is_some_and(|stop| stop < start) {
                    return Err(SkipReason::InvalidTimeRange);
                }
                Ok(Slot::Timed { start, stop })
            }
        };
    }

    let date = raw.date.as_deref().ok_or(SkipReason::MissingStart)?;
    match parse_timestamp(date, tz)? {
        ParsedTime::Day(day) => Ok(Slot::WholeDay(day)),
        ParsedTime::Instant(instant) => Ok(Slot::WholeDay(instant.date_naive())),
    }
}

/// Pairs season and episode. The flag is set when a value had to be dropped.
fn episode_number(season: Option<u32>, episode: Option<u32>) -> (Option<EpisodeNumber>, bool) {
    match (season, episode) {
        (None, None) => (None, false),
        (Some(season), Some(episode)) => match EpisodeNumber::new(season, episode) {
            Some(pair) => (Some(pair), false),
            None => (None, true),
        },
        _ => (None, true),
    }
}
