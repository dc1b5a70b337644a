//! Configured source dispatch.

use anyhow::Result;
use ptepg_core::{Horizon, RawBatch};

use crate::api::Collector;
use crate::catalog::MeoCatalog;
use crate::feed::FeedCollector;

/// One configured source.
///
/// `Collector` is not object safe, so heterogeneous source lists use this
/// enum instead of trait objects.
#[derive(Debug)]
pub enum Source {
    /// Built-in MEO lineup.
    Meo(MeoCatalog),
    /// Raw-record JSON feed.
    Feed(FeedCollector),
}

impl Collector for Source {
    fn name(&self) -> &str {
        match self {
            Self::Meo(catalog) => catalog.name(),
            Self::Feed(feed) => feed.name(),
        }
    }

    async fn collect(&self, horizon: &Horizon) -> Result<RawBatch> {
        match self {
            Self::Meo(catalog) => catalog.collect(horizon).await,
            Self::Feed(feed) => feed.collect(horizon).await,
        }
    }
}

/// Runs the sources one after another, preserving their order.
///
/// # Errors
///
/// Returns the first source error; later sources are not run.
pub async fn collect_all(sources: &[Source], horizon: &Horizon) -> Result<Vec<RawBatch>> {
    let mut batches = Vec::with_capacity(sources.len());
    for source in sources {
        let batch = source.collect(horizon).await.map_err(|e| {
            e.context(format!("source {} failed", source.name()))
        })?;
        tracing::info!(
            source = source.name(),
            channels = batch.channels.len(),
            programs = batch.programs.len(),
            "source collected"
        );
        batches.push(batch);
    }
    Ok(batches)
}
