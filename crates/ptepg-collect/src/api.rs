//! `Collector` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;
use ptepg_core::{Horizon, RawBatch};

/// Source of raw provider records.
///
/// One implementation per provider or transport. Uses `trait_variant::make`
/// to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(Collector: Send)]
pub trait LocalCollector {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Collects the records covering `horizon`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or decoded.
    async fn collect(&self, horizon: &Horizon) -> Result<RawBatch>;
}
