//! Swap-event classification.
//!
//! Turns a raw indexer event into a [`NormalizedTrade`]: native coin into
//! the pool makes a buy, native coin out makes a sell, and the two flags
//! are computed independently of each other.

use crate::domain::amount::{native_units, units_from_raw};
use crate::domain::trade::NormalizedTrade;
use crate::error::Result;
use crate::port::outbound::indexer::RawSwapEvent;
use crate::port::outbound::resolver::AddressResolver;

/// Classify one raw swap event.
///
/// Amounts are taken from the active side: buys carry (native-in,
/// token-out), sales carry (native-out, token-in). If both flags are set
/// the buy side wins; reconciliation suppresses the purchase in that case
/// anyway. Events with neither flag come back unclassified without a
/// resolver round-trip.
///
/// # Errors
///
/// Malformed amounts surface as [`EventError`](crate::domain::error::EventError);
/// resolver failures propagate as-is. Both are contained to the event by
/// the caller.
pub async fn classify(
    event: &RawSwapEvent,
    resolver: &dyn AddressResolver,
) -> Result<NormalizedTrade> {
    let is_buy = event.native_in > 0;
    let is_sell = event.native_out > 0;

    if !is_buy && !is_sell {
        return Ok(NormalizedTrade::unclassified(
            event.wallet.as_str(),
            event.token_address.as_str(),
        ));
    }

    let wallet = resolver.canonicalize(&event.wallet).await?;
    let token = resolver.canonicalize(&event.token_address).await?;

    let (native_amount, token_amount) = if is_buy {
        (
            native_units(event.native_in),
            units_from_raw(&event.token_out_raw, event.token_decimals)?,
        )
    } else {
        (
            native_units(event.native_out),
            units_from_raw(&event.token_in_raw, event.token_decimals)?,
        )
    };

    Ok(NormalizedTrade {
        wallet,
        token,
        token_name: event.token_name.clone(),
        token_symbol: event.token_symbol.clone(),
        token_decimals: event.token_decimals,
        native_amount,
        token_amount,
        is_buy,
        is_sell,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::domain::id::Address;
    use crate::error::Error;

    /// Canonicalizes by prefixing, so tests can tell resolved addresses
    /// from raw ones.
    struct PrefixResolver;

    #[async_trait]
    impl AddressResolver for PrefixResolver {
        async fn canonicalize(&self, address: &str) -> Result<Address> {
            Ok(Address::new(format!("UQ{address}")))
        }

        async fn validate(&self, _address: &str) -> Result<bool> {
            Ok(true)
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl AddressResolver for FailingResolver {
        async fn canonicalize(&self, _address: &str) -> Result<Address> {
            Err(Error::Connection("resolver down".into()))
        }

        async fn validate(&self, _address: &str) -> Result<bool> {
            Err(Error::Connection("resolver down".into()))
        }
    }

    struct PanicResolver;

    #[async_trait]
    impl AddressResolver for PanicResolver {
        async fn canonicalize(&self, _address: &str) -> Result<Address> {
            panic!("resolver must not be consulted");
        }

        async fn validate(&self, _address: &str) -> Result<bool> {
            panic!("resolver must not be consulted");
        }
    }

    fn swap(native_in: u128, native_out: u128) -> RawSwapEvent {
        RawSwapEvent {
            event_id: "evt-1".into(),
            wallet: "wallet".into(),
            native_in,
            native_out,
            token_in_raw: "7000000".into(),
            token_out_raw: "4000000000".into(),
            token_address: "jetton".into(),
            token_name: "Kilo".into(),
            token_symbol: "KILO".into(),
            token_decimals: 6,
            timestamp: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_native_in_classifies_as_buy() {
        // 25.4 TON in, 4000 KILO out
        let trade = classify(&swap(25_400_000_000, 0), &PrefixResolver)
            .await
            .unwrap();

        assert!(trade.is_buy && !trade.is_sell);
        assert_eq!(trade.wallet.as_str(), "UQwallet");
        assert_eq!(trade.token.as_str(), "UQjetton");
        assert_eq!(trade.native_amount, 25);
        assert_eq!(trade.token_amount, 4_000);
        assert_eq!(trade.token_name, "Kilo");
        assert_eq!(trade.token_symbol, "KILO");
        assert_eq!(trade.token_decimals, 6);
    }

    #[tokio::test]
    async fn test_native_out_classifies_as_sell() {
        // 7 KILO in, 3 TON out
        let trade = classify(&swap(0, 3_000_000_000), &PrefixResolver)
            .await
            .unwrap();

        assert!(trade.is_sell && !trade.is_buy);
        assert_eq!(trade.native_amount, 3);
        assert_eq!(trade.token_amount, 7);
    }

    #[tokio::test]
    async fn test_both_legs_keep_both_flags_with_buy_amounts() {
        let trade = classify(&swap(10_000_000_000, 3_000_000_000), &PrefixResolver)
            .await
            .unwrap();

        assert!(trade.is_buy && trade.is_sell);
        assert_eq!(trade.native_amount, 10);
        assert_eq!(trade.token_amount, 4_000);
    }

    #[tokio::test]
    async fn test_neither_leg_skips_the_resolver() {
        let trade = classify(&swap(0, 0), &PanicResolver).await.unwrap();

        assert!(!trade.is_buy && !trade.is_sell);
        assert_eq!(trade.native_amount, 0);
    }

    #[tokio::test]
    async fn test_resolver_failure_propagates() {
        let err = classify(&swap(1_000_000_000, 0), &FailingResolver)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[tokio::test]
    async fn test_malformed_amount_is_an_event_error() {
        let mut event = swap(1_000_000_000, 0);
        event.token_out_raw = "not-a-number".into();

        let err = classify(&event, &PrefixResolver).await.unwrap_err();
        assert!(matches!(err, Error::Event(_)));
    }

    #[tokio::test]
    async fn test_negative_decimals_is_an_event_error() {
        let mut event = swap(1_000_000_000, 0);
        event.token_decimals = -1;

        let err = classify(&event, &PrefixResolver).await.unwrap_err();
        assert!(matches!(err, Error::Event(_)));
    }
}
