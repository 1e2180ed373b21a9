//! Periodic cache-to-store statistics reconciliation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::domain::entities::Link;
use crate::domain::repositories::{LinkRepository, StatsUpdate};
use crate::error::AppError;
use crate::infrastructure::cache::{CachedStats, LinkCache};

/// Outcome of a single reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// Links examined.
    pub scanned: usize,
    /// Links whose store counters were rewritten.
    pub updated: usize,
    /// Links skipped because their cached stats could not be read.
    pub skipped: usize,
}

/// Periodically flushes cached redirect counters back to the store.
///
/// Redirects only ever touch the cache, so this task is the sole writer of
/// `redirect_count` and `last_used` in the store. Each pass scans every link,
/// compares the row against its cached counters, and commits all rewrites in
/// one transaction at the end of the pass.
///
/// Counters accumulated between the last pass and a shutdown are not lost:
/// they stay in the cache and the first pass after the next boot picks them
/// up.
pub struct StatsReconciler {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn LinkCache>,
    interval: Duration,
}

impl StatsReconciler {
    /// Creates a new reconciler that syncs every `interval`.
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn LinkCache>,
        interval: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            interval,
        }
    }

    /// Runs reconciliation passes until `shutdown` flips to `true`.
    ///
    /// The first pass runs immediately; later passes follow at the configured
    /// interval. A failed pass is logged and the loop keeps going.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Stats reconciler started (every {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            match self.run_once().await {
                Ok(summary) if summary.updated > 0 => {
                    info!(
                        "Stats pass: {}/{} links updated, {} skipped",
                        summary.updated, summary.scanned, summary.skipped
                    );
                }
                Ok(summary) => {
                    debug!("Stats pass: {} links scanned, nothing to update", summary.scanned);
                }
                Err(e) => {
                    error!("Stats pass failed: {}", e);
                }
            }
        }

        info!("Stats reconciler stopped");
    }

    /// Performs one reconciliation pass.
    ///
    /// A link whose cached stats cannot be read or decoded is skipped for
    /// this pass only; the rest of the pass proceeds.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the link scan or the final
    /// transaction fails.
    pub async fn run_once(&self) -> Result<PassSummary, AppError> {
        let started = Instant::now();
        let links = self.repository.list_all().await?;

        let mut summary = PassSummary {
            scanned: links.len(),
            ..Default::default()
        };
        let mut updates = Vec::new();

        for link in &links {
            match self.cache.get_stats(&link.short_code).await {
                Ok(Some(stats)) => {
                    if let Some(update) = reconcile(link, &stats) {
                        updates.push(update);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    summary.skipped += 1;
                    warn!("Skipping stats for {}: {}", link.short_code, e);
                }
            }
        }

        if !updates.is_empty() {
            summary.updated = updates.len();
            self.repository.apply_stats_updates(&updates).await?;
        }

        debug!(
            "Reconciliation pass over {} links took {:?}",
            summary.scanned,
            started.elapsed()
        );

        Ok(summary)
    }
}

/// Compares a link's stored counters with its cached stats.
///
/// Returns the row rewrite to apply, or `None` when the store already
/// matches. The cached `redirect_count` is a running total, not a delta: when
/// it differs it replaces the store value outright, even if it is lower
/// (a lower value means the stats record expired and restarted, since the
/// cache is the only place redirects are counted). `last_used` keeps
/// whichever timestamp is newest, with an empty store value treated as
/// oldest.
fn reconcile(link: &Link, stats: &CachedStats) -> Option<StatsUpdate> {
    let last_used = match (stats.last_used, link.last_used) {
        (Some(cached), Some(stored)) => Some(cached.max(stored)),
        (Some(cached), None) => Some(cached),
        (None, stored) => stored,
    };

    if stats.redirect_count == link.redirect_count && last_used == link.last_used {
        return None;
    }

    Some(StatsUpdate {
        link_id: link.id,
        redirect_count: stats.redirect_count,
        last_used,
    })
}
