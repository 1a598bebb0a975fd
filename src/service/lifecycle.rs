//! Contest lifecycle: start, manual stop, automatic end.
//!
//! The command surface and the poll tasks both drive contests through
//! this one service, so every transition runs the same steps in the same
//! order regardless of who triggered it.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::error::ContestError;
use crate::domain::group::GroupDirectory;
use crate::domain::id::{Address, GroupId};
use crate::domain::ledger::LedgerEntry;
use crate::domain::registry::ContestRegistry;
use crate::port::outbound::notifier::{Notice, NotifierRegistry};
use crate::port::outbound::store::ContestStore;
use crate::service::poller::PollTasks;

/// How a contest ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    /// Operator stop. The standings stay listable until the next start.
    Manual,
    /// Deadline reached. The record and its persisted rows are removed.
    Expired,
}

/// Start and conclude contests against the shared engine state.
pub struct ContestLifecycle {
    registry: Arc<ContestRegistry>,
    directory: Arc<GroupDirectory>,
    store: Arc<dyn ContestStore>,
    notifiers: Arc<NotifierRegistry>,
    tasks: Arc<PollTasks>,
}

impl ContestLifecycle {
    /// Create the lifecycle service over shared engine state.
    #[must_use]
    pub fn new(
        registry: Arc<ContestRegistry>,
        directory: Arc<GroupDirectory>,
        store: Arc<dyn ContestStore>,
        notifiers: Arc<NotifierRegistry>,
        tasks: Arc<PollTasks>,
    ) -> Self {
        Self {
            registry,
            directory,
            store,
            notifiers,
            tasks,
        }
    }

    /// Start a contest for `group` ending at `deadline` (unix seconds).
    ///
    /// The group must be registered, have a token bound, and have at
    /// least one discovered pool. The poll task itself is spawned by the
    /// scheduler's next reconcile pass.
    ///
    /// # Errors
    ///
    /// [`ContestError::AlreadyActive`] while a contest is running, plus
    /// the precondition errors above.
    pub fn start(&self, group: GroupId, deadline: i64) -> Result<(), ContestError> {
        let profile = self
            .directory
            .get(group)
            .ok_or(ContestError::UnknownGroup { group })?;
        let token = profile.token.ok_or(ContestError::NoToken { group })?;
        if profile.pools.is_empty() {
            return Err(ContestError::NoPools { token });
        }

        self.registry.start(group, deadline)?;
        self.directory.set_active(group, true)?;

        info!(group = %group, deadline, token = %token, "Contest started");
        self.notifiers
            .notify_all(Notice::ContestStarted { group, deadline });
        Ok(())
    }

    /// Conclude a contest.
    ///
    /// Registry, store, and notification work all happen before the poll
    /// task is stopped, so a task concluding itself finishes its cleanup
    /// before its handle is aborted.
    ///
    /// # Errors
    ///
    /// The manual path reports [`ContestError::NotActive`] when there is
    /// nothing to stop; the expired path is silent about it.
    pub async fn conclude(&self, group: GroupId, end: End) -> Result<(), ContestError> {
        match end {
            End::Manual => {
                let record = self
                    .registry
                    .get(group)
                    .filter(|r| r.is_active())
                    .ok_or(ContestError::NotActive { group })?;

                record.conclude_manual();
                self.deactivate(group);
                info!(group = %group, "Contest stopped by operator");
                self.tasks.stop(group);
                Ok(())
            }
            End::Expired => {
                let Some(record) = self.registry.get(group) else {
                    return Ok(());
                };
                if !record.is_active() {
                    return Ok(());
                }

                self.registry.remove(group);
                if let Err(err) = self.store.delete_contest(group).await {
                    error!(group = %group, %err, "Failed to delete persisted contest");
                }
                self.deactivate(group);
                info!(group = %group, "Contest ended at deadline");
                self.notifiers.notify_all(Notice::ContestEnded { group });
                self.tasks.stop(group);
                Ok(())
            }
        }
    }

    /// Remove one wallet's standing purchase (operator disqualification).
    ///
    /// Works against a manually concluded contest too, as long as its
    /// record is still around.
    ///
    /// # Errors
    ///
    /// [`ContestError::NotActive`] without a record,
    /// [`ContestError::NoPurchase`] when the wallet has nothing standing.
    pub fn remove_buyer(
        &self,
        group: GroupId,
        wallet: &Address,
    ) -> Result<LedgerEntry, ContestError> {
        let record = self
            .registry
            .get(group)
            .ok_or(ContestError::NotActive { group })?;

        let entry = record
            .remove_purchase_by_wallet(wallet)
            .ok_or_else(|| ContestError::NoPurchase {
                wallet: wallet.clone(),
            })?;

        info!(group = %group, wallet = %wallet, "Purchase removed by operator");
        Ok(entry)
    }

    fn deactivate(&self, group: GroupId) {
        // The directory entry outlives every contest; a miss here means
        // state was tampered with externally, and the conclude must
        // still finish.
        if let Err(err) = self.directory.set_active(group, false) {
            warn!(group = %group, %err, "Group missing from directory while concluding");
        }
    }
}
