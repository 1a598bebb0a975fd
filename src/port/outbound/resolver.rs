//! Address resolver port: canonical form and validity of TON addresses.

use async_trait::async_trait;

use crate::domain::id::Address;
use crate::error::Result;

/// Resolves raw address representations to their canonical form.
///
/// Indexers report wallets in several encodings; every address that
/// reaches a ledger goes through [`canonicalize`](AddressResolver::canonicalize)
/// first so reconciliation compares like with like.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Canonical human-readable form of `address`.
    async fn canonicalize(&self, address: &str) -> Result<Address>;

    /// Whether operator input parses as a TON address.
    async fn validate(&self, address: &str) -> Result<bool>;
}
