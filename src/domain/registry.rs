//! The single owner of all per-group contest state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::contest::ContestRecord;
use crate::domain::error::ContestError;
use crate::domain::id::GroupId;

/// Concurrent map of group → [`ContestRecord`], shared via `Arc`.
///
/// The registry lock only guards the map itself; ledger operations inside
/// a record take the record's own locks. Callers that act on a record
/// after an await point must re-fetch it first, since a concurrent stop
/// may have removed it.
#[derive(Debug, Default)]
pub struct ContestRegistry {
    contests: RwLock<HashMap<GroupId, Arc<ContestRecord>>>,
}

impl ContestRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a contest for `group` ending at `deadline`.
    ///
    /// Installs a fresh record, discarding any concluded leftover. Fails
    /// with [`ContestError::AlreadyActive`] while a contest is running.
    pub fn start(&self, group: GroupId, deadline: i64) -> Result<Arc<ContestRecord>, ContestError> {
        let mut contests = self.contests.write();
        if contests.get(&group).is_some_and(|r| r.is_active()) {
            return Err(ContestError::AlreadyActive { group });
        }

        let record = Arc::new(ContestRecord::new(deadline));
        contests.insert(group, Arc::clone(&record));
        Ok(record)
    }

    /// Install a restored record, replacing whatever is there.
    pub fn install(&self, group: GroupId, record: ContestRecord) {
        self.contests.write().insert(group, Arc::new(record));
    }

    /// The group's record, active or concluded.
    #[must_use]
    pub fn get(&self, group: GroupId) -> Option<Arc<ContestRecord>> {
        self.contests.read().get(&group).cloned()
    }

    /// Remove and return the group's record.
    pub fn remove(&self, group: GroupId) -> Option<Arc<ContestRecord>> {
        self.contests.write().remove(&group)
    }

    /// Whether any record exists for the group.
    #[must_use]
    pub fn contains(&self, group: GroupId) -> bool {
        self.contests.read().contains_key(&group)
    }

    /// True iff the group has a deadline and `now` has reached it.
    #[must_use]
    pub fn check_ended(&self, group: GroupId, now: i64) -> bool {
        self.contests
            .read()
            .get(&group)
            .is_some_and(|r| r.check_ended(now))
    }

    /// Groups with a running contest, sorted for deterministic iteration.
    #[must_use]
    pub fn active_groups(&self) -> Vec<GroupId> {
        let mut groups: Vec<GroupId> = self
            .contests
            .read()
            .iter()
            .filter(|(_, r)| r.is_active())
            .map(|(g, _)| *g)
            .collect();
        groups.sort();
        groups
    }

    /// Snapshot of every record, for the backup sync.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(GroupId, Arc<ContestRecord>)> {
        let mut all: Vec<(GroupId, Arc<ContestRecord>)> = self
            .contests
            .read()
            .iter()
            .map(|(g, r)| (*g, Arc::clone(r)))
            .collect();
        all.sort_by_key(|(g, _)| *g);
        all
    }
}
