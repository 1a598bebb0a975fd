//! Persistence port for group profiles and contest ledgers.

use async_trait::async_trait;

use crate::domain::group::GroupProfile;
use crate::domain::id::GroupId;
use crate::domain::ledger::LedgerEntry;
use crate::error::Result;

/// One group's persisted contest state, as loaded at startup.
#[derive(Debug, Clone)]
pub struct PersistedContest {
    /// Group the contest belongs to.
    pub group: GroupId,
    /// Purchase ledger rows, insertion order preserved via `seq`.
    pub purchases: Vec<LedgerEntry>,
    /// Sale ledger rows.
    pub sales: Vec<LedgerEntry>,
    /// Unix deadline, `None` for a manually concluded contest.
    pub deadline: Option<i64>,
}

/// Storage operations for the group directory and contest ledgers.
///
/// The backup service writes through this port on an interval; restore
/// reads everything back once at startup.
#[async_trait]
pub trait ContestStore: Send + Sync {
    /// Save a group profile, replacing if it exists.
    async fn save_group(&self, profile: &GroupProfile) -> Result<()>;

    /// Delete a group profile. Returns whether a row was removed.
    async fn delete_group(&self, group: GroupId) -> Result<bool>;

    /// Load every persisted group profile.
    async fn load_groups(&self) -> Result<Vec<GroupProfile>>;

    /// Replace a group's persisted contest rows with the given snapshot.
    async fn replace_contest(
        &self,
        group: GroupId,
        purchases: &[LedgerEntry],
        sales: &[LedgerEntry],
        deadline: Option<i64>,
    ) -> Result<()>;

    /// Load every persisted contest.
    async fn load_contests(&self) -> Result<Vec<PersistedContest>>;

    /// Delete a group's persisted contest rows and deadline.
    async fn delete_contest(&self, group: GroupId) -> Result<()>;
}
