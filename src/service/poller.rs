//! Per-group polling: the task set, the reconcile loop, and the tick
//! pipeline.
//!
//! Each group with a running contest gets one background task that polls
//! the group's pools on a fixed interval. A reconcile loop keeps the task
//! set aligned with the registry: it spawns tasks for newly started
//! contests, stops tasks whose contest went away, and reaps handles that
//! finished on their own.
//!
//! All task-set mutation goes through [`PollTasks`], a single synchronized
//! entry point, so a task concluding itself and an operator stop cannot
//! race each other into a half-stopped state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::contest::{ContestRecord, PurchaseOutcome, SaleOutcome};
use crate::domain::group::{GroupDirectory, GroupProfile};
use crate::domain::id::GroupId;
use crate::domain::registry::ContestRegistry;
use crate::domain::trade::NormalizedTrade;
use crate::error::Error;
use crate::port::outbound::indexer::SwapEventSource;
use crate::port::outbound::notifier::{BuyAlertNotice, Notice, NotifierRegistry};
use crate::port::outbound::resolver::AddressResolver;
use crate::service::classifier::classify;
use crate::service::lifecycle::{ContestLifecycle, End};

/// How often the reconcile loop compares the task set to the registry.
const RECONCILE_INTERVAL: Duration = Duration::from_secs(5);

/// The set of running poll tasks, one per group.
///
/// Every spawn, stop, and reap goes through this map and its one lock.
/// Stopping aborts the handle; aborting a task that already finished is
/// harmless.
#[derive(Debug, Default)]
pub struct PollTasks {
    tasks: Mutex<HashMap<GroupId, JoinHandle<()>>>,
}

impl PollTasks {
    /// Create an empty task set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a task is installed for the group.
    #[must_use]
    pub fn contains(&self, group: GroupId) -> bool {
        self.tasks.lock().contains_key(&group)
    }

    /// Groups with an installed task, sorted for deterministic iteration.
    #[must_use]
    pub fn groups(&self) -> Vec<GroupId> {
        let mut groups: Vec<GroupId> = self.tasks.lock().keys().copied().collect();
        groups.sort();
        groups
    }

    /// Number of installed tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Install a task for the group, aborting any previous one.
    pub fn install(&self, group: GroupId, handle: JoinHandle<()>) {
        if let Some(old) = self.tasks.lock().insert(group, handle) {
            old.abort();
        }
    }

    /// Stop the group's task. Returns false if none was installed.
    pub fn stop(&self, group: GroupId) -> bool {
        match self.tasks.lock().remove(&group) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Stop every task.
    pub fn stop_all(&self) {
        let mut tasks = self.tasks.lock();
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
    }

    /// Drop handles whose task already finished. Returns how many.
    pub fn reap_finished(&self) -> usize {
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|_, handle| !handle.is_finished());
        before - tasks.len()
    }
}

/// Spawns and supervises the per-group poll tasks.
///
/// Cheap to clone; clones share the same task set and caches.
#[derive(Clone)]
pub struct PollScheduler {
    inner: Arc<PollInner>,
}

struct PollInner {
    registry: Arc<ContestRegistry>,
    directory: Arc<GroupDirectory>,
    tasks: Arc<PollTasks>,
    lifecycle: Arc<ContestLifecycle>,
    events: Arc<dyn SwapEventSource>,
    resolver: Arc<dyn AddressResolver>,
    notifiers: Arc<NotifierRegistry>,
    /// Event ids already processed, per group. Pruned when the group's
    /// contest record goes away.
    seen: DashMap<GroupId, HashSet<String>>,
    poll_interval: Duration,
    leaderboard_size: usize,
}

impl PollScheduler {
    /// Create a scheduler over shared engine state.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        registry: Arc<ContestRegistry>,
        directory: Arc<GroupDirectory>,
        tasks: Arc<PollTasks>,
        lifecycle: Arc<ContestLifecycle>,
        events: Arc<dyn SwapEventSource>,
        resolver: Arc<dyn AddressResolver>,
        notifiers: Arc<NotifierRegistry>,
        poll_interval: Duration,
        leaderboard_size: usize,
    ) -> Self {
        Self {
            inner: Arc::new(PollInner {
                registry,
                directory,
                tasks,
                lifecycle,
                events,
                resolver,
                notifiers,
                seen: DashMap::new(),
                poll_interval,
                leaderboard_size,
            }),
        }
    }

    /// Run the reconcile loop until the surrounding task is aborted.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(RECONCILE_INTERVAL);
        debug!("Poll scheduler started");
        loop {
            ticker.tick().await;
            self.reconcile();
        }
    }

    /// One reconcile pass: align the task set with the registry.
    pub fn reconcile(&self) {
        let reaped = self.inner.tasks.reap_finished();
        if reaped > 0 {
            debug!(reaped, "Reaped finished poll tasks");
        }

        let active = self.inner.registry.active_groups();
        for group in &active {
            if !self.inner.tasks.contains(*group) {
                self.spawn_group(*group);
            }
        }

        for group in self.inner.tasks.groups() {
            if !active.contains(&group) {
                info!(group = %group, "Stopping poll task for inactive contest");
                self.inner.tasks.stop(group);
            }
        }

        let registry = Arc::clone(&self.inner.registry);
        self.inner.seen.retain(|group, _| registry.contains(*group));
    }

    /// One poll pass for a group; exposed for tests. Returns true when
    /// the contest is over and the task should exit.
    pub async fn tick(&self, group: GroupId) -> bool {
        self.inner.tick(group).await
    }

    fn spawn_group(&self, group: GroupId) {
        info!(group = %group, "Spawning poll task");
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(inner.run_group(group));
        self.inner.tasks.install(group, handle);
    }
}

impl PollInner {
    async fn run_group(self: Arc<Self>, group: GroupId) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if self.tick(group).await {
                break;
            }
        }
        debug!(group = %group, "Poll task exiting");
    }

    async fn tick(&self, group: GroupId) -> bool {
        let Some(profile) = self.directory.get(group) else {
            return false;
        };
        if profile.token.is_none() || profile.pools.is_empty() {
            return false;
        }

        for pool in &profile.pools {
            let event = match self.events.latest_event(pool).await {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(err) => {
                    warn!(
                        group = %group,
                        pool = %pool.address,
                        venue = %pool.venue,
                        %err,
                        "Failed to fetch pool events"
                    );
                    continue;
                }
            };

            if self.is_seen(group, &event.event_id) {
                continue;
            }

            let trade = match classify(&event, self.resolver.as_ref()).await {
                Ok(trade) => {
                    self.mark_seen(group, &event.event_id);
                    trade
                }
                // Malformed payloads never improve; mark them seen so
                // they are skipped instead of re-logged every tick.
                Err(Error::Event(err)) => {
                    self.mark_seen(group, &event.event_id);
                    warn!(group = %group, event = %event.event_id, %err, "Skipping malformed event");
                    continue;
                }
                // Transient failures leave the event unmarked for a
                // retry on the next tick.
                Err(err) => {
                    warn!(group = %group, event = %event.event_id, %err, "Failed to classify event");
                    continue;
                }
            };

            if !trade.is_buy && !trade.is_sell {
                debug!(group = %group, event = %event.event_id, "Event is neither buy nor sell");
                continue;
            }

            // Re-fetch after the awaits above; a concurrent stop may
            // have concluded the contest.
            let Some(record) = self.registry.get(group) else {
                return true;
            };
            if !record.is_active() {
                return true;
            }

            if trade.is_sell {
                self.apply_sale(group, &record, trade.clone());
            }
            if trade.is_buy {
                self.apply_purchase(group, &profile, &record, trade);
            }
        }

        let now = chrono::Utc::now().timestamp();
        if self.registry.check_ended(group, now) {
            info!(group = %group, "Contest deadline reached");
            if let Err(err) = self.lifecycle.conclude(group, End::Expired).await {
                warn!(group = %group, %err, "Failed to conclude expired contest");
            }
            return true;
        }

        false
    }

    fn apply_sale(&self, group: GroupId, record: &ContestRecord, trade: NormalizedTrade) {
        let wallet = trade.wallet.clone();
        match record.record_sale(trade) {
            SaleOutcome::Recorded {
                cancelled: Some(entry),
            } => {
                info!(
                    group = %group,
                    wallet = %entry.trade.wallet,
                    ton = entry.trade.native_amount,
                    "Standing purchase cancelled by sale"
                );
            }
            SaleOutcome::Recorded { cancelled: None } => {
                debug!(group = %group, wallet = %wallet, "Sale recorded");
            }
            SaleOutcome::Duplicate => {
                debug!(group = %group, wallet = %wallet, "Duplicate sale ignored");
            }
        }
    }

    fn apply_purchase(
        &self,
        group: GroupId,
        profile: &GroupProfile,
        record: &ContestRecord,
        trade: NormalizedTrade,
    ) {
        match record.record_purchase(trade.clone()) {
            PurchaseOutcome::Accepted { .. } => {
                info!(
                    group = %group,
                    wallet = %trade.wallet,
                    ton = trade.native_amount,
                    "Purchase recorded"
                );
                self.emit_buy_alert(group, profile, record, &trade);
            }
            PurchaseOutcome::Duplicate => {
                debug!(group = %group, wallet = %trade.wallet, "Duplicate purchase ignored");
            }
            PurchaseOutcome::Disqualified => {
                info!(
                    group = %group,
                    wallet = %trade.wallet,
                    "Purchase suppressed, wallet sold during the contest"
                );
            }
        }
    }

    fn emit_buy_alert(
        &self,
        group: GroupId,
        profile: &GroupProfile,
        record: &ContestRecord,
        trade: &NormalizedTrade,
    ) {
        let Some(deadline) = record.deadline() else {
            return;
        };
        let Some(rank) = record.rank_of(&trade.wallet) else {
            return;
        };

        self.notifiers.notify_all(Notice::BuyAlert(BuyAlertNotice {
            group,
            token_name: trade.token_name.clone(),
            token_symbol: trade.token_symbol.clone(),
            buyer: trade.wallet.clone(),
            ton_amount: trade.native_amount,
            token_amount: trade.token_amount,
            emoji: profile.emoji.clone(),
            rank,
            top: record.leaderboard(self.leaderboard_size),
            deadline,
        }));
    }

    fn is_seen(&self, group: GroupId, event_id: &str) -> bool {
        self.seen
            .get(&group)
            .is_some_and(|ids| ids.contains(event_id))
    }

    fn mark_seen(&self, group: GroupId, event_id: &str) {
        self.seen
            .entry(group)
            .or_default()
            .insert(event_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G: GroupId = GroupId::new(-100);

    fn pending_task() -> JoinHandle<()> {
        tokio::spawn(std::future::pending())
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let tasks = PollTasks::new();
        tasks.install(G, pending_task());
        assert!(tasks.contains(G));

        assert!(tasks.stop(G));
        assert!(!tasks.stop(G));
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_install_replaces_previous_task() {
        let tasks = PollTasks::new();
        tasks.install(G, pending_task());
        tasks.install(G, pending_task());
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_stop_all_clears_the_set() {
        let tasks = PollTasks::new();
        tasks.install(G, pending_task());
        tasks.install(GroupId::new(-200), pending_task());
        assert_eq!(tasks.groups(), vec![GroupId::new(-200), G]);

        tasks.stop_all();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_reap_finished_removes_done_tasks() {
        let tasks = PollTasks::new();
        tasks.install(G, tokio::spawn(async {}));
        tasks.install(GroupId::new(-200), pending_task());

        let mut reaped = 0;
        for _ in 0..100 {
            reaped += tasks.reap_finished();
            if reaped == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(reaped, 1);
        assert_eq!(tasks.groups(), vec![GroupId::new(-200)]);
    }
}
