//! Channel identity, numbering and icon resolution.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;

use url::Url;

use super::text::clean_text;
use crate::model::Channel;
use crate::raw::RawChannel;
use crate::report::{RecordOutcome, SkipReason};

/// A normalized channel plus the provider-internal id it can be referenced by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ResolvedChannel {
    pub channel: Channel,
    pub alias: Option<String>,
}

/// Resolves a channel icon. Invalid or non-HTTP URLs fall back to `default_icon`.
pub(super) fn resolve_icon(raw: Option<&str>, default_icon: &Url) -> Url {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return default_icon.clone();
    };

    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        _ => {
            tracing::warn!(icon = %raw, "invalid channel icon URL, using default");
            default_icon.clone()
        }
    }
}

/// Normalizes one raw channel record.
pub(super) fn normalize_channel(
    raw: &RawChannel,
    default_icon: &Url,
) -> RecordOutcome<ResolvedChannel> {
    let Some(id) = clean_text(raw.service_id.as_deref()) else {
        return RecordOutcome::Skipped(SkipReason::MissingServiceId);
    };

    let display_name = clean_text(raw.name.as_deref()).unwrap_or_else(|| id.clone());
    let alias = clean_text(raw.channel_id.as_deref()).filter(|alias| *alias != id);

    RecordOutcome::Accepted(ResolvedChannel {
        channel: Channel {
            number: raw.number.and_then(NonZeroU32::new),
            icon: resolve_icon(raw.icon.as_deref(), default_icon),
            display_name,
            id,
        },
        alias,
    })
}

/// Channel lineup under construction.
///
/// Keyed by canonical id; internal provider ids are kept as aliases so
/// program records can reference either.
#[derive(Debug, Default)]
pub(super) struct ChannelTable {
    channels: BTreeMap<String, Channel>,
    aliases: HashMap<String, String>,
}

impl ChannelTable {
    /// Inserts a channel. Returns `true` if it replaced one with the same id.
    pub fn insert(&mut self, resolved: ResolvedChannel) -> bool {
        let ResolvedChannel { channel, alias } = resolved;
        if let Some(alias) = alias {
            self.aliases.insert(alias, channel.id.clone());
        }
        self.channels.insert(channel.id.clone(), channel).is_some()
    }

    /// Resolves a program's channel reference to a channel.
    pub fn resolve(&self, reference: &str) -> Option<&Channel> {
        self.channels.get(reference).or_else(|| {
            self.aliases
                .get(reference)
                .and_then(|id| self.channels.get(id))
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Consumes the table, returning channels in display order.
    pub fn into_display_order(self) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self.channels.into_values().collect();
        channels.sort_by(Channel::display_cmp);
        channels
    }
}
