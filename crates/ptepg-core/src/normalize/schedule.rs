//! Turns accepted candidates into the final, ordered program list.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use super::PlaceholderText;
use super::program::Details;
use crate::model::{Channel, Horizon, Program, ProgramKey, day_end, day_start, schedule_cmp};
use crate::report::{NormalizeReport, SkipReason};

/// Length given to the last program of a channel when its stop is unknown.
const DEFAULT_PROGRAM_MINUTES: i64 = 30;

/// A timed candidate after deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TimedEntry {
    pub stop: Option<DateTime<Utc>>,
    pub details: Details,
}

/// Whole-day candidates keyed by channel and day.
pub(super) type WholeDays = BTreeMap<(String, NaiveDate), Details>;

/// Builds the final program list.
///
/// Fills missing stops, emits one whole-day program for every channel/day
/// without timed coverage, and orders the result by `(channel_id, start)`.
pub(super) fn assemble(
    channels: &[Channel],
    timed: BTreeMap<ProgramKey, TimedEntry>,
    mut whole_days: WholeDays,
    horizon: &Horizon,
    placeholder: &PlaceholderText,
    report: &mut NormalizeReport,
) -> Vec<Program> {
    let mut programs = fill_stops(timed);

    let covered: BTreeSet<(&str, NaiveDate)> = programs
        .iter()
        .flat_map(|program| {
            horizon
                .dates()
                .filter(move |day| program.overlaps(day_start(*day), day_end(*day)))
                .map(move |day| (program.channel_id.as_str(), day))
        })
        .collect();

    let mut placeholders = Vec::new();
    for channel in channels {
        for day in horizon.dates() {
            let provided = whole_days.remove(&(channel.id.clone(), day));

            if covered.contains(&(channel.id.as_str(), day)) {
                if provided.is_some() {
                    tracing::debug!(channel = %channel.id, %day, "date-only record superseded by timed schedule");
                    report.record_skip(SkipReason::SupersededByTimedSchedule);
                }
                continue;
            }

            let details = provided.map_or_else(
                || synthesized(channel, placeholder),
                |mut details| {
                    details
                        .description
                        .get_or_insert_with(|| placeholder.description.clone());
                    details
                },
            );
            placeholders.push(build_program(
                channel.id.clone(),
                day_start(day),
                day_end(day),
                details,
                true,
            ));
        }
    }

    report.placeholders = placeholders.len();
    programs.extend(placeholders);
    programs.sort_by(schedule_cmp);
    report.programs = programs.len();
    programs
}

/// Converts timed entries to programs, closing open-ended ones.
///
/// A missing stop becomes the next start on the same channel, or
/// `DEFAULT_PROGRAM_MINUTES` after the start for the last program.
fn fill_stops(timed: BTreeMap<ProgramKey, TimedEntry>) -> Vec<Program> {
    let mut programs = Vec::with_capacity(timed.len());
    let mut entries = timed.into_iter().peekable();

    while let Some((key, entry)) = entries.next() {
        let next_start = entries
            .peek()
            .filter(|(next, _)| next.channel_id == key.channel_id)
            .map(|(next, _)| next.start);
        let stop = entry
            .stop
            .or(next_start)
            .unwrap_or_else(|| default_stop(key.start));
        programs.push(build_program(
            key.channel_id,
            key.start,
            stop,
            entry.details,
            false,
        ));
    }

    programs
}

fn default_stop(start: DateTime<Utc>) -> DateTime<Utc> {
    TimeDelta::try_minutes(DEFAULT_PROGRAM_MINUTES)
        .and_then(|length| start.checked_add_signed(length))
        .unwrap_or(start)
}

fn synthesized(channel: &Channel, placeholder: &PlaceholderText) -> Details {
    Details {
        title: format!("{} {}", placeholder.title_prefix, channel.display_name),
        description: Some(placeholder.description.clone()),
        ..Details::default()
    }
}

fn build_program(
    channel_id: String,
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
    details: Details,
    placeholder: bool,
) -> Program {
    let Details {
        title,
        subtitle,
        description,
        genre,
        release_year,
        rating,
        episode,
    } = details;

    Program {
        channel_id,
        start,
        stop,
        title,
        subtitle,
        description,
        genre,
        release_year,
        rating,
        episode,
        placeholder,
    }
}
