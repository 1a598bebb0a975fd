//! Service wiring and the long-running application loop.
//!
//! [`App::build`] assembles the engine from configuration: storage and
//! restore first, then the notifier surface, then the lifecycle, poll
//! scheduler, and backup services on top of the shared state. [`App::run`]
//! drives the periodic loops until the caller's shutdown signal fires,
//! after which [`App::shutdown`] takes a final backup snapshot and stops
//! the poll tasks.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::geckoterminal::GeckoTerminalLocator;
use crate::adapter::outbound::sqlite::{create_pool, run_migrations, SqliteContestStore};
use crate::adapter::outbound::tonapi::TonapiClient;
use crate::adapter::outbound::toncenter::ToncenterResolver;
use crate::app::config::Config;
use crate::domain::group::GroupDirectory;
use crate::domain::registry::ContestRegistry;
use crate::error::Result;
use crate::port::outbound::locator::PoolLocator;
use crate::port::outbound::notifier::{LogNotifier, NotifierRegistry};
use crate::port::outbound::resolver::AddressResolver;
use crate::port::outbound::store::ContestStore;
use crate::service::{restore_state, BackupService, ContestLifecycle, PollScheduler, PollTasks};

/// The wired application: shared engine state plus its services.
pub struct App {
    config: Config,
    directory: Arc<GroupDirectory>,
    registry: Arc<ContestRegistry>,
    tasks: Arc<PollTasks>,
    lifecycle: Arc<ContestLifecycle>,
    resolver: Arc<dyn AddressResolver>,
    locator: Arc<dyn PoolLocator>,
    scheduler: PollScheduler,
    backup: BackupService,
}

impl App {
    /// Wire every service from configuration and restore persisted state.
    ///
    /// # Errors
    ///
    /// Fails when the database cannot be opened, migrated, or read back;
    /// a store that is unreadable at startup is fatal.
    pub async fn build(config: Config) -> Result<Self> {
        let pool = create_pool(&config.database.path)?;
        run_migrations(&pool)?;
        let store: Arc<dyn ContestStore> = Arc::new(SqliteContestStore::new(pool));

        let directory = Arc::new(GroupDirectory::new());
        let registry = Arc::new(ContestRegistry::new());
        restore_state(store.as_ref(), &directory, &registry).await?;

        let notifiers = Arc::new(build_notifier_registry(&config));
        info!(notifiers = notifiers.len(), "Notifiers initialized");

        let tasks = Arc::new(PollTasks::new());
        let lifecycle = Arc::new(ContestLifecycle::new(
            Arc::clone(&registry),
            Arc::clone(&directory),
            Arc::clone(&store),
            Arc::clone(&notifiers),
            Arc::clone(&tasks),
        ));

        let events = Arc::new(TonapiClient::from_config(&config.indexer));
        let resolver: Arc<dyn AddressResolver> =
            Arc::new(ToncenterResolver::from_config(&config.resolver));
        let locator: Arc<dyn PoolLocator> =
            Arc::new(GeckoTerminalLocator::from_config(&config.locator));

        let scheduler = PollScheduler::new(
            Arc::clone(&registry),
            Arc::clone(&directory),
            Arc::clone(&tasks),
            Arc::clone(&lifecycle),
            events,
            Arc::clone(&resolver),
            Arc::clone(&notifiers),
            config.indexer.poll_interval(),
            config.contest.leaderboard_size,
        );

        let backup = BackupService::new(
            Arc::clone(&directory),
            Arc::clone(&registry),
            Arc::clone(&store),
            config.backup.interval(),
        );

        Ok(Self {
            config,
            directory,
            registry,
            tasks,
            lifecycle,
            resolver,
            locator,
            scheduler,
            backup,
        })
    }

    /// Run the engine loops; returns only when the runtime is shut down.
    pub async fn run(&self) {
        self.spawn_command_surface();

        info!("tonrally engine running");
        tokio::join!(self.scheduler.run(), self.backup.run());
    }

    /// Final backup snapshot, then stop every poll task.
    pub async fn shutdown(&self) {
        info!("Shutting down, taking a final backup snapshot");
        self.backup.sync().await;
        self.tasks.stop_all();
    }

    #[cfg(feature = "telegram")]
    fn spawn_command_surface(&self) {
        use crate::adapter::outbound::telegram::{command_worker, CommandDispatcher};

        if !self.config.telegram.enabled {
            info!("Telegram surface disabled by configuration");
            return;
        }

        let dispatcher = Arc::new(CommandDispatcher::new(
            Arc::clone(&self.directory),
            Arc::clone(&self.registry),
            Arc::clone(&self.lifecycle),
            Arc::clone(&self.resolver),
            Arc::clone(&self.locator),
            self.config.contest.clone(),
        ));
        tokio::spawn(command_worker(
            self.config.telegram.bot_token.clone(),
            dispatcher,
        ));
    }

    #[cfg(not(feature = "telegram"))]
    fn spawn_command_surface(&self) {
        info!("Built without the telegram feature; no command surface");
    }
}

#[cfg(feature = "telegram")]
fn build_notifier_registry(config: &Config) -> NotifierRegistry {
    use crate::adapter::outbound::telegram::TelegramNotifier;

    let mut notifiers = NotifierRegistry::new();
    if config.telegram.enabled {
        notifiers.register(Box::new(TelegramNotifier::new(
            config.telegram.bot_token.clone(),
            config.promo.clone(),
        )));
    } else {
        notifiers.register(Box::new(LogNotifier));
    }
    notifiers
}

#[cfg(not(feature = "telegram"))]
fn build_notifier_registry(_config: &Config) -> NotifierRegistry {
    let mut notifiers = NotifierRegistry::new();
    notifiers.register(Box::new(LogNotifier));
    notifiers
}
