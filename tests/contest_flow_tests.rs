//! End-to-end contest flow driven through the poll pipeline with
//! scripted pool events and a real SQLite store.

mod harness;

use std::sync::Arc;
use std::time::Duration;

use tonrally::domain::{
    Address, ContestError, ContestRegistry, GroupDirectory, GroupId, PoolRef, Venue, DEFAULT_EMOJI,
};
use tonrally::port::outbound::indexer::SwapEventSource;
use tonrally::port::outbound::notifier::{Notice, NotifierRegistry};
use tonrally::port::outbound::resolver::AddressResolver;
use tonrally::port::outbound::store::ContestStore;
use tonrally::service::{ContestLifecycle, End, PollScheduler, PollTasks};

use harness::identity_resolver::IdentityResolver;
use harness::recording_notifier::RecordingNotifier;
use harness::scripted_source::{raw_buy, raw_sell, ScriptedEventSource};
use harness::temp_store::TempDb;

const GROUP: GroupId = GroupId::new(-1_001_000);
const STONFI_POOL: &str = "EQPoolStonfi";
const DEDUST_POOL: &str = "EQPoolDedust";
const JETTON: &str = "EQJetton";

/// Far enough out that nothing expires during a test run.
const FAR_DEADLINE: i64 = 4_102_444_800;

struct Engine {
    directory: Arc<GroupDirectory>,
    registry: Arc<ContestRegistry>,
    tasks: Arc<PollTasks>,
    lifecycle: Arc<ContestLifecycle>,
    scheduler: PollScheduler,
    source: Arc<ScriptedEventSource>,
    notifier: RecordingNotifier,
    _db: TempDb,
}

fn stonfi_pool() -> PoolRef {
    PoolRef {
        address: Address::new(STONFI_POOL),
        venue: Venue::StonFi,
    }
}

fn dedust_pool() -> PoolRef {
    PoolRef {
        address: Address::new(DEDUST_POOL),
        venue: Venue::DeDust,
    }
}

fn engine_with_pools(pools: Vec<PoolRef>) -> Engine {
    let db = TempDb::create();
    let store: Arc<dyn ContestStore> = Arc::new(db.store());

    let directory = Arc::new(GroupDirectory::new());
    let registry = Arc::new(ContestRegistry::new());
    let tasks = Arc::new(PollTasks::new());

    let notifier = RecordingNotifier::new();
    let mut notifiers = NotifierRegistry::new();
    notifiers.register(Box::new(notifier.clone()));
    let notifiers = Arc::new(notifiers);

    let lifecycle = Arc::new(ContestLifecycle::new(
        Arc::clone(&registry),
        Arc::clone(&directory),
        store,
        Arc::clone(&notifiers),
        Arc::clone(&tasks),
    ));

    let source = Arc::new(ScriptedEventSource::new());
    let resolver: Arc<dyn AddressResolver> = Arc::new(IdentityResolver);

    let scheduler = PollScheduler::new(
        Arc::clone(&registry),
        Arc::clone(&directory),
        Arc::clone(&tasks),
        Arc::clone(&lifecycle),
        Arc::clone(&source) as Arc<dyn SwapEventSource>,
        resolver,
        notifiers,
        Duration::from_millis(10),
        10,
    );

    directory.register(GROUP);
    directory
        .set_token(GROUP, Address::new(JETTON), pools)
        .expect("bind token");

    Engine {
        directory,
        registry,
        tasks,
        lifecycle,
        scheduler,
        source,
        notifier,
        _db: db,
    }
}

fn engine() -> Engine {
    engine_with_pools(vec![stonfi_pool()])
}

fn ended_count(notifier: &RecordingNotifier) -> usize {
    notifier
        .notices()
        .iter()
        .filter(|notice| matches!(notice, Notice::ContestEnded { .. }))
        .count()
}

#[tokio::test]
async fn test_accepted_purchase_is_ranked_and_alerted() {
    let engine = engine();
    engine.lifecycle.start(GROUP, FAR_DEADLINE).expect("start");

    engine.source.push_event(STONFI_POOL, raw_buy("e1", "W1", 10));
    assert!(!engine.scheduler.tick(GROUP).await);

    let record = engine.registry.get(GROUP).expect("record");
    assert_eq!(record.purchase_count(), 1);

    let alerts = engine.notifier.buy_alerts();
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.group, GROUP);
    assert_eq!(alert.buyer.as_str(), "W1");
    assert_eq!(alert.ton_amount, 10);
    assert_eq!(alert.token_amount, 40_000);
    assert_eq!(alert.token_symbol, "KILO");
    assert_eq!(alert.rank, 1);
    assert_eq!(alert.top.len(), 1);
    assert_eq!(alert.emoji, DEFAULT_EMOJI);
    assert_eq!(alert.deadline, FAR_DEADLINE);
}

#[tokio::test]
async fn test_repeated_event_id_is_processed_once() {
    let engine = engine();
    engine.lifecycle.start(GROUP, FAR_DEADLINE).expect("start");

    engine.source.push_event(STONFI_POOL, raw_buy("e1", "W1", 10));
    engine.source.push_event(STONFI_POOL, raw_buy("e1", "W1", 10));
    assert!(!engine.scheduler.tick(GROUP).await);
    assert!(!engine.scheduler.tick(GROUP).await);

    let record = engine.registry.get(GROUP).expect("record");
    assert_eq!(record.purchase_count(), 1);
    assert_eq!(engine.notifier.buy_alerts().len(), 1);
}

#[tokio::test]
async fn test_same_trade_under_new_event_id_is_deduplicated() {
    let engine = engine();
    engine.lifecycle.start(GROUP, FAR_DEADLINE).expect("start");

    // Different event ids, byte-identical trade content.
    engine.source.push_event(STONFI_POOL, raw_buy("e1", "W1", 10));
    engine.source.push_event(STONFI_POOL, raw_buy("e2", "W1", 10));
    assert!(!engine.scheduler.tick(GROUP).await);
    assert!(!engine.scheduler.tick(GROUP).await);

    let record = engine.registry.get(GROUP).expect("record");
    assert_eq!(record.purchase_count(), 1);
    assert_eq!(engine.notifier.buy_alerts().len(), 1);
}

#[tokio::test]
async fn test_sale_cancels_standing_purchase() {
    let engine = engine();
    engine.lifecycle.start(GROUP, FAR_DEADLINE).expect("start");

    engine.source.push_event(STONFI_POOL, raw_buy("e1", "W1", 10));
    engine.source.push_event(STONFI_POOL, raw_sell("e2", "W1", 4));
    assert!(!engine.scheduler.tick(GROUP).await);
    assert!(!engine.scheduler.tick(GROUP).await);

    let record = engine.registry.get(GROUP).expect("record");
    assert_eq!(record.purchase_count(), 0);
    assert_eq!(record.sales_snapshot().len(), 1);
    // Only the original buy alerted; the cancellation is silent.
    assert_eq!(engine.notifier.buy_alerts().len(), 1);
}

#[tokio::test]
async fn test_prior_seller_cannot_requalify() {
    let engine = engine();
    engine.lifecycle.start(GROUP, FAR_DEADLINE).expect("start");

    engine.source.push_event(STONFI_POOL, raw_sell("e1", "W1", 4));
    engine.source.push_event(STONFI_POOL, raw_buy("e2", "W1", 10));
    assert!(!engine.scheduler.tick(GROUP).await);
    assert!(!engine.scheduler.tick(GROUP).await);

    let record = engine.registry.get(GROUP).expect("record");
    assert_eq!(record.purchase_count(), 0);
    assert!(engine.notifier.buy_alerts().is_empty());
}

#[tokio::test]
async fn test_standings_order_by_ton_spent() {
    let engine = engine();
    engine.lifecycle.start(GROUP, FAR_DEADLINE).expect("start");

    engine.source.push_event(STONFI_POOL, raw_buy("e1", "W1", 10));
    engine.source.push_event(STONFI_POOL, raw_buy("e2", "W2", 25));
    assert!(!engine.scheduler.tick(GROUP).await);
    assert!(!engine.scheduler.tick(GROUP).await);

    let record = engine.registry.get(GROUP).expect("record");
    let top = record.leaderboard(10);
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].trade.wallet.as_str(), "W2");
    assert_eq!(top[1].trade.wallet.as_str(), "W1");

    let alerts = engine.notifier.buy_alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].rank, 1);
    // The bigger buy takes first place as it lands.
    assert_eq!(alerts[1].rank, 1);
    assert_eq!(alerts[1].top[0].trade.wallet.as_str(), "W2");
}

#[tokio::test]
async fn test_pool_fetch_failure_does_not_abort_the_tick() {
    let engine = engine_with_pools(vec![stonfi_pool(), dedust_pool()]);
    engine.lifecycle.start(GROUP, FAR_DEADLINE).expect("start");

    engine.source.push_error(STONFI_POOL, "indexer down");
    engine.source.push_event(DEDUST_POOL, raw_buy("e1", "W1", 10));
    assert!(!engine.scheduler.tick(GROUP).await);

    let record = engine.registry.get(GROUP).expect("record");
    assert_eq!(record.purchase_count(), 1);
}

#[tokio::test]
async fn test_deadline_expiry_concludes_the_contest() {
    let engine = engine();
    let past = chrono::Utc::now().timestamp() - 1;
    engine.lifecycle.start(GROUP, past).expect("start");

    engine.source.push_event(STONFI_POOL, raw_buy("e1", "W1", 10));
    assert!(engine.scheduler.tick(GROUP).await);

    assert!(engine.registry.get(GROUP).is_none());
    assert!(!engine.directory.get(GROUP).expect("profile").contest_active);
    assert_eq!(ended_count(&engine.notifier), 1);

    // A straggler tick after conclusion is a no-op.
    assert!(!engine.scheduler.tick(GROUP).await);
    assert_eq!(ended_count(&engine.notifier), 1);
}

#[tokio::test]
async fn test_manual_stop_keeps_standings_listable() {
    let engine = engine();
    engine.lifecycle.start(GROUP, FAR_DEADLINE).expect("start");

    engine.source.push_event(STONFI_POOL, raw_buy("e1", "W1", 10));
    assert!(!engine.scheduler.tick(GROUP).await);

    engine
        .lifecycle
        .conclude(GROUP, End::Manual)
        .await
        .expect("manual stop");

    // The record stays around for standings queries.
    let record = engine.registry.get(GROUP).expect("record");
    assert!(!record.is_active());
    assert_eq!(record.purchase_count(), 1);
    assert!(!engine.directory.get(GROUP).expect("profile").contest_active);
    assert_eq!(ended_count(&engine.notifier), 0);

    let err = engine
        .lifecycle
        .conclude(GROUP, End::Manual)
        .await
        .unwrap_err();
    assert!(matches!(err, ContestError::NotActive { .. }));
}

#[tokio::test]
async fn test_start_requires_a_bound_token() {
    let engine = engine();
    let other = GroupId::new(-42);
    engine.directory.register(other);

    let err = engine.lifecycle.start(other, FAR_DEADLINE).unwrap_err();
    assert!(matches!(err, ContestError::NoToken { .. }));

    let err = engine
        .lifecycle
        .start(GroupId::new(-43), FAR_DEADLINE)
        .unwrap_err();
    assert!(matches!(err, ContestError::UnknownGroup { .. }));
}

#[tokio::test]
async fn test_second_start_is_rejected_while_active() {
    let engine = engine();
    engine.lifecycle.start(GROUP, FAR_DEADLINE).expect("start");

    let err = engine.lifecycle.start(GROUP, FAR_DEADLINE).unwrap_err();
    assert!(matches!(err, ContestError::AlreadyActive { .. }));
}

#[tokio::test]
async fn test_reconcile_aligns_tasks_with_active_contests() {
    let engine = engine();
    engine.lifecycle.start(GROUP, FAR_DEADLINE).expect("start");

    engine.scheduler.reconcile();
    assert!(engine.tasks.contains(GROUP));
    assert_eq!(engine.tasks.len(), 1);

    engine
        .lifecycle
        .conclude(GROUP, End::Manual)
        .await
        .expect("manual stop");
    engine.scheduler.reconcile();
    assert!(engine.tasks.is_empty());
}
