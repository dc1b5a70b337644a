//! Collectors for ptepg.
//!
//! Each collector turns one provider source into a [`ptepg_core::RawBatch`].

mod api;
mod catalog;
mod feed;
mod source;

#[allow(clippy::module_name_repetitions)]
pub use api::{Collector, LocalCollector};
pub use catalog::MeoCatalog;
#[allow(clippy::module_name_repetitions)]
pub use feed::{FeedCollector, FeedCollectorBuilder, FeedLocation};
pub use source::{Source, collect_all};
