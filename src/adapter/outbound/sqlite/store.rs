//! SQLite contest store implementation.
//!
//! Persists group profiles and contest ledger snapshots through Diesel.
//! The backup service replaces whole snapshots, so writes are coarse and
//! transactional rather than row-by-row.

use std::collections::BTreeMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::SqliteConnection;

use crate::adapter::outbound::sqlite::connection::DbPool;
use crate::adapter::outbound::sqlite::model::{DeadlineRow, GroupRow, PurchaseRow, SaleRow};
use crate::adapter::outbound::sqlite::schema::{deadlines, groups, purchases, sales};
use crate::domain::group::GroupProfile;
use crate::domain::id::GroupId;
use crate::domain::ledger::LedgerEntry;
use crate::error::{Error, Result};
use crate::port::outbound::store::{ContestStore, PersistedContest};

/// SQLite-backed contest store.
///
/// Implements the [`ContestStore`] trait over the shared connection
/// pool.
pub struct SqliteContestStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteContestStore {
    /// Create a new store over the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }
}

#[async_trait]
impl ContestStore for SqliteContestStore {
    async fn save_group(&self, profile: &GroupProfile) -> Result<()> {
        let row = GroupRow::from_profile(profile)?;
        let mut conn = self.conn()?;

        diesel::replace_into(groups::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete_group(&self, group: GroupId) -> Result<bool> {
        let mut conn = self.conn()?;

        let deleted = diesel::delete(groups::table.find(group.value()))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(deleted > 0)
    }

    async fn load_groups(&self) -> Result<Vec<GroupProfile>> {
        let mut conn = self.conn()?;

        let rows: Vec<GroupRow> = groups::table
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(GroupRow::into_profile).collect()
    }

    async fn replace_contest(
        &self,
        group: GroupId,
        purchase_entries: &[LedgerEntry],
        sale_entries: &[LedgerEntry],
        deadline: Option<i64>,
    ) -> Result<()> {
        let purchase_rows: Vec<PurchaseRow> = purchase_entries
            .iter()
            .map(|e| PurchaseRow::from_entry(group, e))
            .collect();
        let sale_rows: Vec<SaleRow> = sale_entries
            .iter()
            .map(|e| SaleRow::from_entry(group, e))
            .collect();
        let deadline_row = DeadlineRow {
            group_id: group.value(),
            deadline,
        };

        let mut conn = self.conn()?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(purchases::table.filter(purchases::group_id.eq(group.value())))
                .execute(conn)?;
            diesel::delete(sales::table.filter(sales::group_id.eq(group.value())))
                .execute(conn)?;
            if !purchase_rows.is_empty() {
                diesel::insert_into(purchases::table)
                    .values(&purchase_rows)
                    .execute(conn)?;
            }
            if !sale_rows.is_empty() {
                diesel::insert_into(sales::table)
                    .values(&sale_rows)
                    .execute(conn)?;
            }
            diesel::replace_into(deadlines::table)
                .values(&deadline_row)
                .execute(conn)?;
            Ok(())
        })
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn load_contests(&self) -> Result<Vec<PersistedContest>> {
        let mut conn = self.conn()?;

        let deadline_rows: Vec<DeadlineRow> = deadlines::table
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let purchase_rows: Vec<PurchaseRow> = purchases::table
            .order((purchases::group_id.asc(), purchases::seq.asc()))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let sale_rows: Vec<SaleRow> = sales::table
            .order((sales::group_id.asc(), sales::seq.asc()))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        // The deadlines row anchors a contest; ledger rows without one
        // are still restored rather than dropped.
        let mut by_group: BTreeMap<i64, PersistedContest> = BTreeMap::new();
        for row in deadline_rows {
            by_group.insert(row.group_id, empty_contest(row.group_id, row.deadline));
        }
        for row in purchase_rows {
            by_group
                .entry(row.group_id)
                .or_insert_with(|| empty_contest(row.group_id, None))
                .purchases
                .push(row.into_entry());
        }
        for row in sale_rows {
            by_group
                .entry(row.group_id)
                .or_insert_with(|| empty_contest(row.group_id, None))
                .sales
                .push(row.into_entry());
        }

        Ok(by_group.into_values().collect())
    }

    async fn delete_contest(&self, group: GroupId) -> Result<()> {
        let mut conn = self.conn()?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(purchases::table.filter(purchases::group_id.eq(group.value())))
                .execute(conn)?;
            diesel::delete(sales::table.filter(sales::group_id.eq(group.value())))
                .execute(conn)?;
            diesel::delete(deadlines::table.filter(deadlines::group_id.eq(group.value())))
                .execute(conn)?;
            Ok(())
        })
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }
}

fn empty_contest(group_id: i64, deadline: Option<i64>) -> PersistedContest {
    PersistedContest {
        group: GroupId::new(group_id),
        purchases: Vec::new(),
        sales: Vec::new(),
        deadline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::adapter::outbound::sqlite::connection::{create_pool, run_migrations};
    use crate::domain::group::{PoolRef, Venue};
    use crate::domain::id::Address;
    use crate::domain::trade::NormalizedTrade;

    const G: GroupId = GroupId::new(-100);

    fn store() -> (tempfile::NamedTempFile, SqliteContestStore) {
        let file = tempfile::NamedTempFile::new().unwrap();
        let pool = create_pool(file.path().to_str().unwrap()).unwrap();
        run_migrations(&pool).unwrap();
        (file, SqliteContestStore::new(pool))
    }

    fn entry(wallet: &str, ton: u64, seq: u64) -> LedgerEntry {
        LedgerEntry {
            trade: NormalizedTrade::buy(wallet, "EQJetton", ton, ton * 1_000),
            seq,
        }
    }

    #[tokio::test]
    async fn test_group_save_load_delete() {
        let (_file, store) = store();

        let mut profile = GroupProfile::new(G);
        profile.token = Some(Address::new("EQJetton"));
        profile.pools = vec![PoolRef {
            address: Address::new("EQPool"),
            venue: Venue::StonFi,
        }];
        store.save_group(&profile).await.unwrap();

        // saving again replaces the row instead of duplicating it
        profile.emoji = "🚀".to_string();
        store.save_group(&profile).await.unwrap();

        let loaded = store.load_groups().await.unwrap();
        assert_eq!(loaded, vec![profile]);

        assert!(store.delete_group(G).await.unwrap());
        assert!(!store.delete_group(G).await.unwrap());
        assert!(store.load_groups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_contest_replace_and_load() {
        let (_file, store) = store();

        let purchases = vec![entry("w1", 10, 0), entry("w2", 20, 1)];
        let sales = vec![LedgerEntry {
            trade: NormalizedTrade::sell("w3", "EQJetton", 5, 100),
            seq: 0,
        }];
        store
            .replace_contest(G, &purchases, &sales, Some(9_000))
            .await
            .unwrap();

        // snapshots replace wholesale
        store
            .replace_contest(G, &purchases[..1], &sales, Some(9_000))
            .await
            .unwrap();

        let contests = store.load_contests().await.unwrap();
        assert_eq!(contests.len(), 1);
        let contest = &contests[0];
        assert_eq!(contest.group, G);
        assert_eq!(contest.deadline, Some(9_000));
        assert_eq!(contest.purchases, &purchases[..1]);
        assert_eq!(contest.sales, sales);
    }

    #[tokio::test]
    async fn test_manual_contest_keeps_null_deadline() {
        let (_file, store) = store();
        store
            .replace_contest(G, &[entry("w1", 10, 0)], &[], None)
            .await
            .unwrap();

        let contests = store.load_contests().await.unwrap();
        assert_eq!(contests[0].deadline, None);
        assert_eq!(contests[0].purchases.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_contest_clears_all_rows() {
        let (_file, store) = store();
        store
            .replace_contest(G, &[entry("w1", 10, 0)], &[], Some(1))
            .await
            .unwrap();

        store.delete_contest(G).await.unwrap();
        assert!(store.load_contests().await.unwrap().is_empty());

        // deleting again is a no-op
        store.delete_contest(G).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_preserves_seq_order() {
        let (_file, store) = store();
        let purchases = vec![entry("w9", 9, 5), entry("w1", 1, 0), entry("w4", 4, 2)];
        store
            .replace_contest(G, &purchases, &[], Some(1))
            .await
            .unwrap();

        let contests = store.load_contests().await.unwrap();
        let seqs: Vec<u64> = contests[0].purchases.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, [0, 2, 5]);
    }

    #[tokio::test]
    async fn test_contests_for_different_groups_stay_apart() {
        let (_file, store) = store();
        let other = GroupId::new(-200);

        store
            .replace_contest(G, &[entry("w1", 10, 0)], &[], Some(1_000))
            .await
            .unwrap();
        store
            .replace_contest(other, &[entry("w2", 20, 0)], &[], Some(2_000))
            .await
            .unwrap();

        store.delete_contest(G).await.unwrap();

        let contests = store.load_contests().await.unwrap();
        assert_eq!(contests.len(), 1);
        assert_eq!(contests[0].group, other);
        assert_eq!(contests[0].deadline, Some(2_000));
    }
}
