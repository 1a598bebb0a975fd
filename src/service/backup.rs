//! Periodic persistence sync and startup restore.
//!
//! Ledgers live in memory; the backup service snapshots the group
//! directory and every contest record through the store on an interval,
//! and once more on shutdown. Failures are logged and the next interval
//! tries again.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::domain::contest::ContestRecord;
use crate::domain::group::GroupDirectory;
use crate::domain::registry::ContestRegistry;
use crate::error::Result;
use crate::port::outbound::store::ContestStore;

/// Writes the live state through the store on a fixed interval.
pub struct BackupService {
    directory: Arc<GroupDirectory>,
    registry: Arc<ContestRegistry>,
    store: Arc<dyn ContestStore>,
    interval: Duration,
}

impl BackupService {
    /// Create the backup service.
    #[must_use]
    pub fn new(
        directory: Arc<GroupDirectory>,
        registry: Arc<ContestRegistry>,
        store: Arc<dyn ContestStore>,
        interval: Duration,
    ) -> Self {
        Self {
            directory,
            registry,
            store,
            interval,
        }
    }

    /// Run sync passes until the surrounding task is aborted.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        // the immediate first tick would re-write what restore just read
        ticker.tick().await;
        debug!(interval_secs = self.interval.as_secs(), "Backup service started");
        loop {
            ticker.tick().await;
            self.sync().await;
        }
    }

    /// One full snapshot of the directory and every contest record.
    pub async fn sync(&self) {
        let mut failures = 0usize;

        for profile in self.directory.all() {
            if let Err(err) = self.store.save_group(&profile).await {
                error!(group = %profile.group_id, %err, "Failed to persist group profile");
                failures += 1;
            }
        }

        for (group, record) in self.registry.snapshot() {
            let purchases = record.purchases_snapshot();
            let sales = record.sales_snapshot();
            if let Err(err) = self
                .store
                .replace_contest(group, &purchases, &sales, record.deadline())
                .await
            {
                error!(group = %group, %err, "Failed to persist contest");
                failures += 1;
            }
        }

        if failures == 0 {
            debug!("Backup sync finished");
        } else {
            error!(failures, "Backup sync finished with failures");
        }
    }
}

/// Load persisted groups and contests back into the live structures.
///
/// Restored contest records re-enter the registry as they were; the
/// scheduler's reconcile loop respawns their poll tasks, and contests
/// that expired while the service was down are concluded by their first
/// tick.
///
/// # Errors
///
/// Propagates store failures; a database that cannot be read at startup
/// is fatal.
pub async fn restore_state(
    store: &dyn ContestStore,
    directory: &GroupDirectory,
    registry: &ContestRegistry,
) -> Result<()> {
    let groups = store.load_groups().await?;
    let group_count = groups.len();
    for profile in groups {
        directory.install(profile);
    }

    let contests = store.load_contests().await?;
    let contest_count = contests.len();
    for persisted in contests {
        registry.install(
            persisted.group,
            ContestRecord::restore(persisted.purchases, persisted.sales, persisted.deadline),
        );
    }

    info!(
        groups = group_count,
        contests = contest_count,
        "State restored from store"
    );
    Ok(())
}
