//! Raw provider records and lenient deserializers.
//!
//! Collectors hand the normalizer these records as-is. Field names follow
//! the feed JSON layout; aliases cover the spellings used by the MEO and
//! NOS endpoints.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Scalar that providers send either as a JSON string or a JSON number.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

impl TextOrNumber {
    fn into_text(self) -> String {
        match self {
            Self::Unsigned(n) => n.to_string(),
            Self::Signed(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// Deserializes a string or number as text; empty strings become `None`.
///
/// # Errors
///
/// Returns an error if the value is neither a scalar nor null.
pub fn deserialize_text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<TextOrNumber> = Option::deserialize(deserializer)?;
    Ok(value
        .map(TextOrNumber::into_text)
        .filter(|s| !s.trim().is_empty()))
}

/// Deserializes a `u32` sent as a number or a numeric string.
///
/// Empty strings, negative numbers and non-numeric text become `None`
/// instead of failing the whole document.
///
/// # Errors
///
/// Returns an error if the value is neither a scalar nor null.
pub fn deserialize_lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<TextOrNumber> = Option::deserialize(deserializer)?;
    Ok(match value {
        None => None,
        Some(TextOrNumber::Unsigned(n)) => u32::try_from(n).ok(),
        Some(TextOrNumber::Signed(n)) => u32::try_from(n).ok(),
        Some(TextOrNumber::Float(_)) => None,
        Some(TextOrNumber::Text(s)) => s.trim().parse::<u32>().ok(),
    })
}

/// How a provider encodes episode titles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleStyle {
    /// Subtitle is sent in its own field.
    #[default]
    Separate,
    /// Subtitle is folded into the title as `"Title - Subtitle"`.
    Concatenated,
}

/// Raw channel record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawChannel {
    /// Provider-internal channel id.
    #[serde(
        default,
        alias = "channelId",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub channel_id: Option<String>,
    /// Broadcast/service id (canonical id).
    #[serde(
        default,
        alias = "serviceId",
        alias = "sigla",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub service_id: Option<String>,
    /// Display name.
    #[serde(default, deserialize_with = "deserialize_text_or_number")]
    pub name: Option<String>,
    /// Logical channel number.
    #[serde(default, deserialize_with = "deserialize_lenient_u32")]
    pub number: Option<u32>,
    /// Logo URL.
    #[serde(
        default,
        alias = "logo",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub icon: Option<String>,
}

/// Raw program record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawProgram {
    /// Channel reference (service id or internal id).
    #[serde(
        default,
        alias = "channel_id",
        alias = "serviceId",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub channel: Option<String>,
    /// Start timestamp; may be date-only.
    #[serde(default, deserialize_with = "deserialize_text_or_number")]
    pub start: Option<String>,
    /// End timestamp.
    #[serde(
        default,
        alias = "stop",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub end: Option<String>,
    /// Broadcast date, for providers without per-slot times.
    #[serde(default, deserialize_with = "deserialize_text_or_number")]
    pub date: Option<String>,
    /// Title, possibly `"Title - Subtitle"`.
    #[serde(default, deserialize_with = "deserialize_text_or_number")]
    pub title: Option<String>,
    /// Episode title.
    #[serde(
        default,
        alias = "sub_title",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub subtitle: Option<String>,
    /// Synopsis.
    #[serde(
        default,
        alias = "desc",
        alias = "synopsis",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub description: Option<String>,
    /// Genre.
    #[serde(
        default,
        alias = "category",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub genre: Option<String>,
    /// Release year (free text or number).
    #[serde(
        default,
        alias = "release_year",
        deserialize_with = "deserialize_text_or_number"
    )]
    pub year: Option<String>,
    /// Parental rating.
    #[serde(default, deserialize_with = "deserialize_text_or_number")]
    pub rating: Option<String>,
    /// Season number (1-indexed).
    #[serde(default, deserialize_with = "deserialize_lenient_u32")]
    pub season: Option<u32>,
    /// Episode number (1-indexed).
    #[serde(default, deserialize_with = "deserialize_lenient_u32")]
    pub episode: Option<u32>,
}

/// Kind of a raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Entry of `channels`.
    Channel,
    /// Entry of `programs`.
    Program,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel => f.write_str("channel"),
            Self::Program => f.write_str("program"),
        }
    }
}

/// Record that could not be decoded into its raw type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    /// Array the record came from.
    pub kind: RecordKind,
    /// Position inside that array.
    pub index: usize,
    /// Decoder error.
    pub error: String,
}

/// Records produced by one collector.
///
/// Entries are decoded one by one: a malformed entry lands in `malformed`
/// and its neighbours are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BatchDocument")]
pub struct RawBatch {
    /// Title encoding used by the source.
    pub title_style: TitleStyle,
    /// Channel records.
    pub channels: Vec<RawChannel>,
    /// Program records.
    pub programs: Vec<RawProgram>,
    /// Entries that failed to decode.
    pub malformed: Vec<MalformedRecord>,
}

/// Wire layout of a batch before per-record decoding.
#[derive(Deserialize)]
struct BatchDocument {
    #[serde(default)]
    title_style: TitleStyle,
    #[serde(default)]
    channels: Vec<Value>,
    #[serde(default)]
    programs: Vec<Value>,
}

impl From<BatchDocument> for RawBatch {
    fn from(doc: BatchDocument) -> Self {
        let mut malformed = Vec::new();
        let channels = decode_records(doc.channels, RecordKind::Channel, &mut malformed);
        let programs = decode_records(doc.programs, RecordKind::Program, &mut malformed);
        Self {
            title_style: doc.title_style,
            channels,
            programs,
            malformed,
        }
    }
}

fn decode_records<T>(
    values: Vec<Value>,
    kind: RecordKind,
    malformed: &mut Vec<MalformedRecord>,
) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(record) => records.push(record),
            Err(e) => malformed.push(MalformedRecord {
                kind,
                index,
                error: e.to_string(),
            }),
        }
    }
    records
}
