//! Canonical guide model shared by the normalizer and the XMLTV serializer.

use std::cmp::Ordering;
use std::num::NonZeroU32;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use url::Url;

/// Default number of days covered by a generation run.
pub const DEFAULT_HORIZON_DAYS: u32 = 7;

/// A normalized channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Broadcast/service identifier, unique within a run.
    pub id: String,
    /// Human-readable channel name.
    pub display_name: String,
    /// Logical channel number (`None` = unranked).
    pub number: Option<NonZeroU32>,
    /// Resolved channel logo.
    pub icon: Url,
}

impl Channel {
    /// Orders channels for display: by number ascending, unranked last,
    /// ties broken by id.
    #[must_use]
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        let by_number = match (self.number, other.number) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_number.then_with(|| self.id.cmp(&other.id))
    }
}

/// Season/episode pair, both 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeNumber {
    /// Season number.
    pub season: NonZeroU32,
    /// Episode number within the season.
    pub episode: NonZeroU32,
}

impl EpisodeNumber {
    /// Builds a pair from raw 1-indexed values. Returns `None` if either is zero.
    #[must_use]
    pub fn new(season: u32, episode: u32) -> Option<Self> {
        Some(Self {
            season: NonZeroU32::new(season)?,
            episode: NonZeroU32::new(episode)?,
        })
    }

    /// Renders the zero-indexed `xmltv_ns` form, e.g. `"2.11."` for S03E12.
    #[must_use]
    pub fn to_xmltv_ns(self) -> String {
        format!(
            "{}.{}.",
            self.season.get().saturating_sub(1),
            self.episode.get().saturating_sub(1)
        )
    }
}

/// Deduplication key of a program.
///
/// Field order matters: the derived `Ord` sorts by channel, then start,
/// which is the order programmes are written in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramKey {
    /// Canonical channel id.
    pub channel_id: String,
    /// Start instant (UTC).
    pub start: DateTime<Utc>,
}

/// A normalized program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Canonical channel id (FK → `Channel::id`).
    pub channel_id: String,
    /// Start instant (UTC).
    pub start: DateTime<Utc>,
    /// Stop instant (UTC), never before `start`.
    pub stop: DateTime<Utc>,
    /// Display title.
    pub title: String,
    /// Episode title.
    pub subtitle: Option<String>,
    /// Synopsis.
    pub description: Option<String>,
    /// Genre/category.
    pub genre: Option<String>,
    /// Release year.
    pub release_year: Option<String>,
    /// Parental rating.
    pub rating: Option<String>,
    /// Season/episode pair.
    pub episode: Option<EpisodeNumber>,
    /// Whole-day entry standing in for missing schedule data.
    pub placeholder: bool,
}

impl Program {
    /// Returns the `(channel_id, start)` key.
    #[must_use]
    pub fn key(&self) -> ProgramKey {
        ProgramKey {
            channel_id: self.channel_id.clone(),
            start: self.start,
        }
    }

    /// Whether the program overlaps the half-open interval `[from, to)`.
    #[must_use]
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start < to && self.stop > from
    }
}

/// Compares programs by `(channel_id, start)`.
#[must_use]
pub fn schedule_cmp(a: &Program, b: &Program) -> Ordering {
    (a.channel_id.as_str(), a.start).cmp(&(b.channel_id.as_str(), b.start))
}

/// Returns midnight UTC of `day`.
#[must_use]
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Returns midnight UTC of the day after `day`, saturating at the maximum date.
#[must_use]
pub fn day_end(day: NaiveDate) -> DateTime<Utc> {
    day.succ_opt().map_or(DateTime::<Utc>::MAX_UTC, day_start)
}

/// Planning horizon: `days` consecutive UTC calendar days from `first_day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    first_day: NaiveDate,
    days: u32,
}

impl Horizon {
    /// Creates a horizon starting at `first_day`.
    #[must_use]
    pub const fn new(first_day: NaiveDate, days: u32) -> Self {
        Self { first_day, days }
    }

    /// Creates a horizon starting at the current UTC date.
    #[must_use]
    pub fn starting_today(days: u32) -> Self {
        Self::new(Utc::now().date_naive(), days)
    }

    /// First calendar day.
    #[must_use]
    pub const fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Number of days.
    #[must_use]
    pub const fn days(&self) -> u32 {
        self.days
    }

    /// Inclusive start instant.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        day_start(self.first_day)
    }

    /// Exclusive end instant.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        TimeDelta::try_days(i64::from(self.days))
            .and_then(|span| self.start().checked_add_signed(span))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether `instant` falls inside the horizon.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start() && instant < self.end()
    }

    /// Whether `day` is one of the horizon's days.
    #[must_use]
    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.contains(day_start(day))
    }

    /// Iterates over the horizon's calendar days.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let count = usize::try_from(self.days).unwrap_or(usize::MAX);
        self.first_day.iter_days().take(count)
    }
}

/// Normalized snapshot handed to the serializer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guide {
    /// Channels, in display order after normalization.
    pub channels: Vec<Channel>,
    /// Programs, in `(channel_id, start)` order after normalization.
    pub programs: Vec<Program>,
}

impl Guide {
    /// Looks up a channel by id.
    #[must_use]
    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Iterates over the programs of one channel.
    pub fn programs_for<'a>(&'a self, channel_id: &'a str) -> impl Iterator<Item = &'a Program> {
        self.programs
            .iter()
            .filter(move |p| p.channel_id == channel_id)
    }
}
