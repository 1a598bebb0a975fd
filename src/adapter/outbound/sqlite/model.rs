//! Database model types for Diesel ORM.

use diesel::prelude::*;

use crate::domain::group::GroupProfile;
use crate::domain::id::{Address, GroupId};
use crate::domain::ledger::LedgerEntry;
use crate::domain::trade::NormalizedTrade;
use crate::error::Result;

use super::schema::{deadlines, groups, purchases, sales};

/// Database row for a group profile.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GroupRow {
    pub group_id: i64,
    pub token_address: Option<String>,
    pub pools_json: String,
    pub emoji: String,
    pub contest_active: i32,
}

impl GroupRow {
    /// Serialize a profile for storage.
    pub fn from_profile(profile: &GroupProfile) -> Result<Self> {
        Ok(Self {
            group_id: profile.group_id.value(),
            token_address: profile.token.as_ref().map(|a| a.as_str().to_string()),
            pools_json: serde_json::to_string(&profile.pools)?,
            emoji: profile.emoji.clone(),
            contest_active: i32::from(profile.contest_active),
        })
    }

    /// Rebuild the domain profile.
    pub fn into_profile(self) -> Result<GroupProfile> {
        Ok(GroupProfile {
            group_id: GroupId::new(self.group_id),
            token: self.token_address.map(Address::new),
            pools: serde_json::from_str(&self.pools_json)?,
            emoji: self.emoji,
            contest_active: self.contest_active != 0,
        })
    }
}

/// Database row for a purchase ledger entry.
///
/// Amounts are `u64` in the domain and stored as their `i64` bit
/// pattern, so values above `i64::MAX` still round-trip.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = purchases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PurchaseRow {
    pub group_id: i64,
    pub content_hash: String,
    pub wallet: String,
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
    pub token_decimals: i64,
    pub native_amount: i64,
    pub token_amount: i64,
    pub is_buy: i32,
    pub is_sell: i32,
    pub seq: i64,
}

impl PurchaseRow {
    pub fn from_entry(group: GroupId, entry: &LedgerEntry) -> Self {
        Self {
            group_id: group.value(),
            content_hash: entry.trade.content_hash().to_hex(),
            wallet: entry.trade.wallet.as_str().to_string(),
            token_address: entry.trade.token.as_str().to_string(),
            token_name: entry.trade.token_name.clone(),
            token_symbol: entry.trade.token_symbol.clone(),
            token_decimals: entry.trade.token_decimals,
            native_amount: entry.trade.native_amount as i64,
            token_amount: entry.trade.token_amount as i64,
            is_buy: i32::from(entry.trade.is_buy),
            is_sell: i32::from(entry.trade.is_sell),
            seq: entry.seq as i64,
        }
    }

    pub fn into_entry(self) -> LedgerEntry {
        LedgerEntry {
            trade: NormalizedTrade {
                wallet: Address::new(self.wallet),
                token: Address::new(self.token_address),
                token_name: self.token_name,
                token_symbol: self.token_symbol,
                token_decimals: self.token_decimals,
                native_amount: self.native_amount as u64,
                token_amount: self.token_amount as u64,
                is_buy: self.is_buy != 0,
                is_sell: self.is_sell != 0,
            },
            seq: self.seq as u64,
        }
    }
}

/// Database row for a sale ledger entry.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = sales)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SaleRow {
    pub group_id: i64,
    pub content_hash: String,
    pub wallet: String,
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
    pub token_decimals: i64,
    pub native_amount: i64,
    pub token_amount: i64,
    pub is_buy: i32,
    pub is_sell: i32,
    pub seq: i64,
}

impl SaleRow {
    pub fn from_entry(group: GroupId, entry: &LedgerEntry) -> Self {
        Self {
            group_id: group.value(),
            content_hash: entry.trade.content_hash().to_hex(),
            wallet: entry.trade.wallet.as_str().to_string(),
            token_address: entry.trade.token.as_str().to_string(),
            token_name: entry.trade.token_name.clone(),
            token_symbol: entry.trade.token_symbol.clone(),
            token_decimals: entry.trade.token_decimals,
            native_amount: entry.trade.native_amount as i64,
            token_amount: entry.trade.token_amount as i64,
            is_buy: i32::from(entry.trade.is_buy),
            is_sell: i32::from(entry.trade.is_sell),
            seq: entry.seq as i64,
        }
    }

    pub fn into_entry(self) -> LedgerEntry {
        LedgerEntry {
            trade: NormalizedTrade {
                wallet: Address::new(self.wallet),
                token: Address::new(self.token_address),
                token_name: self.token_name,
                token_symbol: self.token_symbol,
                token_decimals: self.token_decimals,
                native_amount: self.native_amount as u64,
                token_amount: self.token_amount as u64,
                is_buy: self.is_buy != 0,
                is_sell: self.is_sell != 0,
            },
            seq: self.seq as u64,
        }
    }
}

/// Database row for a contest deadline.
///
/// A row with a `NULL` deadline is a manually concluded contest whose
/// standings are still listable.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = deadlines)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DeadlineRow {
    pub group_id: i64,
    pub deadline: Option<i64>,
}
