//! Per-record outcomes and normalization statistics.

use std::collections::BTreeMap;

/// Why a raw record was left out of the guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// Record whose fields have the wrong JSON types.
    MalformedRecord,
    /// Channel record without a broadcast/service id.
    MissingServiceId,
    /// Program record without a channel reference.
    MissingChannelRef,
    /// Program referencing a channel that is not in the lineup.
    UnknownChannel,
    /// Program record without a title.
    MissingTitle,
    /// Program record without a start time or date.
    MissingStart,
    /// Timestamp in none of the accepted formats.
    InvalidTimestamp,
    /// Local time that falls into a DST gap.
    NonexistentLocalTime,
    /// Stop before start.
    InvalidTimeRange,
    /// Start outside the planning horizon.
    OutsideHorizon,
    /// Date-only record for a day that has a timed schedule.
    SupersededByTimedSchedule,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::MalformedRecord => "malformed record",
            Self::MissingServiceId => "missing service id",
            Self::MissingChannelRef => "missing channel reference",
            Self::UnknownChannel => "unknown channel",
            Self::MissingTitle => "missing title",
            Self::MissingStart => "missing start time",
            Self::InvalidTimestamp => "invalid timestamp",
            Self::NonexistentLocalTime => "nonexistent local time",
            Self::InvalidTimeRange => "stop before start",
            Self::OutsideHorizon => "outside planning horizon",
            Self::SupersededByTimedSchedule => "superseded by timed schedule",
        };
        f.write_str(text)
    }
}

/// Result of normalizing one raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome<T> {
    /// The record produced a normalized value.
    Accepted(T),
    /// The record was skipped; the run continues.
    Skipped(SkipReason),
}

impl<T> From<Result<T, SkipReason>> for RecordOutcome<T> {
    fn from(result: Result<T, SkipReason>) -> Self {
        match result {
            Ok(value) => Self::Accepted(value),
            Err(reason) => Self::Skipped(reason),
        }
    }
}

/// Counters collected during one normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Channels in the final lineup.
    pub channels: usize,
    /// Programs in the final guide, placeholders included.
    pub programs: usize,
    /// Whole-day placeholder programs emitted.
    pub placeholders: usize,
    /// Records replaced by a later record with the same key.
    pub duplicates: usize,
    /// Season/episode values dropped because they were not a valid pair.
    pub lone_episode_numbers: usize,
    skipped: BTreeMap<SkipReason, usize>,
}

impl NormalizeReport {
    /// Counts one skipped record.
    pub fn record_skip(&mut self, reason: SkipReason) {
        let count = self.skipped.entry(reason).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Number of records skipped for `reason`.
    #[must_use]
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Number of records skipped for any reason.
    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    /// Iterates over non-zero skip counters in reason order.
    pub fn skips(&self) -> impl Iterator<Item = (SkipReason, usize)> + '_ {
        self.skipped.iter().map(|(reason, count)| (*reason, *count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_skip_counts_per_reason() {
        // Arrange
        let mut report = NormalizeReport::default();

        // Act
        report.record_skip(SkipReason::UnknownChannel);
        report.record_skip(SkipReason::UnknownChannel);
        report.record_skip(SkipReason::InvalidTimestamp);

        // Assert
        assert_eq!(report.skipped(SkipReason::UnknownChannel), 2);
        assert_eq!(report.skipped(SkipReason::InvalidTimestamp), 1);
        assert_eq!(report.skipped(SkipReason::MissingTitle), 0);
        assert_eq!(report.total_skipped(), 3);
        assert_eq!(
            report.skips().collect::<Vec<_>>(),
            vec![
                (SkipReason::UnknownChannel, 2),
                (SkipReason::InvalidTimestamp, 1)
            ]
        );
    }

    #[test]
    fn test_record_outcome_from_result() {
        // Arrange & Act
        let accepted: RecordOutcome<u32> = Ok(1).into();
        let skipped: RecordOutcome<u32> = Err(SkipReason::MissingTitle).into();

        // Assert
        assert_eq!(accepted, RecordOutcome::Accepted(1));
        assert_eq!(skipped, RecordOutcome::Skipped(SkipReason::MissingTitle));
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::MissingServiceId.to_string(), "missing service id");
        assert_eq!(
            SkipReason::OutsideHorizon.to_string(),
            "outside planning horizon"
        );
    }
}
