use anyhow::Context;
use kitchen_client::{ClientConfig, HttpClient, OrderEventSource};
use std::sync::Arc;
use tokio::time::Instant;

use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind, TaskRegistry};
use crate::orders::{OrderStorage, SyncLoop, SyncMonitor};
use crate::utils::logger::periodic_cleanup;
use crate::views::FleetView;

/// Server state - shared handles to every service
///
/// Cloning is cheap: every field is a handle around shared state.
///
/// | Field | Type | Purpose |
/// |-------|------|---------|
/// | config | Config | Settings (immutable) |
/// | storage | OrderStorage | redb event store |
/// | monitor | SyncMonitor | Last completed sync cycle |
/// | fleet | FleetView | Current fleet view state + reset |
/// | source | Arc<dyn OrderEventSource> | Remote order events |
/// | tasks | TaskRegistry | Background task status |
/// | started_at | Instant | Process start, for uptime |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub storage: OrderStorage,
    pub monitor: SyncMonitor,
    pub fleet: FleetView,
    pub source: Arc<dyn OrderEventSource>,
    pub tasks: TaskRegistry,
    pub started_at: Instant,
}

impl ServerState {
    /// Open the store under the work dir and connect the HTTP source
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)
            .with_context(|| format!("Failed to create work dir {}", config.work_dir))?;

        let db_path = config.database_path();
        let storage = OrderStorage::open(&db_path)
            .with_context(|| format!("Failed to open order database {}", db_path.display()))?;
        tracing::info!(path = %db_path.display(), events = storage.event_count()?, "Order storage opened");

        let client = HttpClient::new(&ClientConfig::new(config.order_source_url.as_str()))?;
        tracing::info!(url = %client.base_url(), "Order event source configured");

        Ok(Self::with_source(config.clone(), storage, Arc::new(client)))
    }

    /// Assemble state around an existing store and source
    pub fn with_source(
        config: Config,
        storage: OrderStorage,
        source: Arc<dyn OrderEventSource>,
    ) -> Self {
        let monitor = SyncMonitor::new();
        let fleet = FleetView::new(storage.clone(), monitor.clone());
        Self {
            config,
            storage,
            monitor,
            fleet,
            source,
            tasks: TaskRegistry::new(),
            started_at: Instant::now(),
        }
    }

    /// Start the sync loop, the fleet view driver and log housekeeping
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new(self.tasks.clone());
        let shutdown = tasks.shutdown_token();

        let sync_loop = SyncLoop::new(
            self.source.clone(),
            self.storage.clone(),
            self.config.sync_config(),
            self.monitor.clone(),
            shutdown.clone(),
        );
        tasks.spawn("sync_loop", TaskKind::Worker, sync_loop.run());
        tasks.spawn(
            "fleet_view",
            TaskKind::Listener,
            self.fleet.clone().run(shutdown.clone()),
        );
        tasks.spawn(
            "log_cleanup",
            TaskKind::Periodic,
            periodic_cleanup(self.config.log_dir(), shutdown),
        );

        tasks.log_summary();
        tasks
    }
}
