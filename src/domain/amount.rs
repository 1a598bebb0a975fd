//! Raw on-chain amounts to whole contest units.
//!
//! Leaderboard math runs on whole-coin integer units: raw amounts are
//! divided by 10^decimals with truncation. TON itself always carries nine
//! decimals.

use crate::domain::error::EventError;

/// Decimal places of the native TON coin.
pub const TON_DECIMALS: u32 = 9;

/// Convert a raw on-chain amount to whole units, truncating.
///
/// Returns 0 when the divisor overflows (absurd decimals) and clamps
/// results that do not fit a u64.
#[must_use]
pub fn to_units(raw: u128, decimals: u32) -> u64 {
    let Some(divisor) = 10u128.checked_pow(decimals) else {
        return 0;
    };
    u64::try_from(raw / divisor).unwrap_or(u64::MAX)
}

/// Convert a raw native (TON) amount to whole units.
#[must_use]
pub fn native_units(raw: u128) -> u64 {
    to_units(raw, TON_DECIMALS)
}

/// Parse a decimal-string raw amount and convert to whole units.
///
/// `decimals` arrives unvalidated from the indexer; a negative value is a
/// malformed event, not a panic.
pub fn units_from_raw(raw: &str, decimals: i64) -> Result<u64, EventError> {
    let decimals = u32::try_from(decimals)
        .map_err(|_| EventError::malformed(format!("negative decimals: {decimals}")))?;
    let raw: u128 = raw
        .trim()
        .parse()
        .map_err(|_| EventError::malformed(format!("unparseable amount: {raw:?}")))?;
    Ok(to_units(raw, decimals))
}
