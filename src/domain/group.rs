//! Group directory: per-chat configuration that outlives any one contest.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::domain::error::ContestError;
use crate::domain::id::{Address, GroupId};

/// Emoji used for buy alerts when a group never picked its own.
pub const DEFAULT_EMOJI: &str = "🦾";

/// DEX venue a pool belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Venue {
    /// STON.fi router pools; swaps surface as a single action.
    StonFi,
    /// DeDust vaults; swaps are reconstructed from the event trace.
    DeDust,
}

impl Venue {
    /// Identifier used on the wire and in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StonFi => "stonfi",
            Self::DeDust => "dedust",
        }
    }

    /// Parse a stored or wire identifier.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stonfi" => Some(Self::StonFi),
            "dedust" => Some(Self::DeDust),
            _ => None,
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered liquidity pool and the venue it runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRef {
    /// Pool account address.
    pub address: Address,
    /// Venue the pool belongs to.
    pub venue: Venue,
}

/// Per-group settings: token binding, discovered pools, alert emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProfile {
    /// Telegram chat this profile belongs to.
    pub group_id: GroupId,
    /// Bound jetton master address, if any.
    pub token: Option<Address>,
    /// TON-quoted pools discovered for the bound token.
    pub pools: Vec<PoolRef>,
    /// Buy-alert emoji.
    pub emoji: String,
    /// Whether a contest is currently running (operator-visible flag,
    /// flipped only by the lifecycle).
    pub contest_active: bool,
}

impl GroupProfile {
    /// Fresh profile for a newly registered group.
    #[must_use]
    pub fn new(group_id: GroupId) -> Self {
        Self {
            group_id,
            token: None,
            pools: Vec::new(),
            emoji: DEFAULT_EMOJI.to_string(),
            contest_active: false,
        }
    }
}

/// Concurrent map of registered groups, shared via `Arc`.
#[derive(Debug, Default)]
pub struct GroupDirectory {
    groups: RwLock<HashMap<GroupId, GroupProfile>>,
}

impl GroupDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group. Returns false if it already exists.
    pub fn register(&self, group: GroupId) -> bool {
        let mut groups = self.groups.write();
        if groups.contains_key(&group) {
            return false;
        }
        groups.insert(group, GroupProfile::new(group));
        true
    }

    /// Whether the group is registered.
    #[must_use]
    pub fn is_registered(&self, group: GroupId) -> bool {
        self.groups.read().contains_key(&group)
    }

    /// Snapshot of one group's profile.
    #[must_use]
    pub fn get(&self, group: GroupId) -> Option<GroupProfile> {
        self.groups.read().get(&group).cloned()
    }

    /// Bind a token and its discovered pools to a group.
    pub fn set_token(
        &self,
        group: GroupId,
        token: Address,
        pools: Vec<PoolRef>,
    ) -> Result<(), ContestError> {
        let mut groups = self.groups.write();
        let profile = groups
            .get_mut(&group)
            .ok_or(ContestError::UnknownGroup { group })?;
        profile.token = Some(token);
        profile.pools = pools;
        Ok(())
    }

    /// Clear a group's token binding and pools.
    pub fn clear_token(&self, group: GroupId) -> Result<(), ContestError> {
        let mut groups = self.groups.write();
        let profile = groups
            .get_mut(&group)
            .ok_or(ContestError::UnknownGroup { group })?;
        profile.token = None;
        profile.pools = Vec::new();
        Ok(())
    }

    /// Set the buy-alert emoji.
    pub fn set_emoji(&self, group: GroupId, emoji: impl Into<String>) -> Result<(), ContestError> {
        let mut groups = self.groups.write();
        let profile = groups
            .get_mut(&group)
            .ok_or(ContestError::UnknownGroup { group })?;
        profile.emoji = emoji.into();
        Ok(())
    }

    /// Flip the contest-running flag.
    pub fn set_active(&self, group: GroupId, active: bool) -> Result<(), ContestError> {
        let mut groups = self.groups.write();
        let profile = groups
            .get_mut(&group)
            .ok_or(ContestError::UnknownGroup { group })?;
        profile.contest_active = active;
        Ok(())
    }

    /// Install a restored profile, replacing whatever is there.
    pub fn install(&self, profile: GroupProfile) {
        self.groups.write().insert(profile.group_id, profile);
    }

    /// Snapshot of every profile, sorted for deterministic iteration.
    #[must_use]
    pub fn all(&self) -> Vec<GroupProfile> {
        let mut all: Vec<GroupProfile> = self.groups.read().values().cloned().collect();
        all.sort_by_key(|p| p.group_id);
        all
    }
}
