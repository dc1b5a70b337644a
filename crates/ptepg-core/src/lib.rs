//! Core of the ptepg guide generator.
//!
//! - [`raw`]: provider records as collected
//! - [`normalize`]: raw records → canonical [`Guide`]
//! - [`xmltv`]: [`Guide`] → XMLTV document

pub mod model;
pub mod normalize;
pub mod raw;
pub mod report;
pub mod xmltv;

pub use model::{Channel, DEFAULT_HORIZON_DAYS, EpisodeNumber, Guide, Horizon, Program, ProgramKey};
pub use normalize::{NormalizeOptions, PlaceholderText, normalize};
pub use raw::{MalformedRecord, RawBatch, RawChannel, RawProgram, RecordKind, TitleStyle};
pub use report::{NormalizeReport, SkipReason};
pub use xmltv::{GeneratorInfo, render, write_guide};
