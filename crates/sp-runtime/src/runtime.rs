//! Wiring and task supervision.
//!
//! ```text
//!                 ┌──────────── LifecycleNotifier ───────────┐
//!                 │                                          ▼
//!  chain ──► IndexerService ── PaymentScheduling ──► PaymentScheduler ──► chain
//!                 │                                          │
//!                 └────────────► LedgerStore ◄───────────────┘
//!                                    ▲
//!                 WebhookNotifier ◄──┴── PaymentNotifier
//! ```
//!
//! Every long-running loop is a separate task that watches the same
//! shutdown channel.

use std::sync::Arc;
use std::time::Duration;

use shared_types::TimeSource;
use sp_01_chain_gateway::ChainGateway;
use sp_03_ledger_store::LedgerRepository;
use sp_04_indexer::{IndexerResult, IndexerService, PaymentScheduling, StartupReport};
use sp_05_payment_scheduler::PaymentScheduler;
use sp_06_webhook_notifier::{WebhookNotifier, WebhookTransport};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::adapters::{NoScheduling, SchedulerBridge, WebhookBridge};
use crate::config::RuntimeConfig;

/// How long [`Runtime::shutdown`] waits for each task to finish.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct Runtime<G: ChainGateway, S: LedgerRepository> {
    indexer: Arc<IndexerService<G, S>>,
    scheduler: Option<Arc<PaymentScheduler<G, S>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl<G, S> Runtime<G, S>
where
    G: ChainGateway + 'static,
    S: LedgerRepository + 'static,
{
    /// Assemble the services around one gateway and one store. The
    /// scheduler is only built when enabled in `config`.
    pub fn new<T: WebhookTransport + 'static>(
        config: &RuntimeConfig,
        gateway: Arc<G>,
        store: Arc<S>,
        transport: Arc<T>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let webhooks = Arc::new(WebhookBridge::new(Arc::new(WebhookNotifier::new(
            store.clone(),
            transport,
            time.clone(),
        ))));

        let scheduler = config.scheduler_enabled.then(|| {
            Arc::new(PaymentScheduler::new(
                config.scheduler.clone(),
                gateway.clone(),
                store.clone(),
                webhooks.clone(),
                time.clone(),
            ))
        });
        let scheduling: Arc<dyn PaymentScheduling> = match &scheduler {
            Some(scheduler) => Arc::new(SchedulerBridge::new(scheduler.clone())),
            None => Arc::new(NoScheduling),
        };

        let indexer = Arc::new(IndexerService::new(
            config.indexer.clone(),
            gateway,
            store,
            webhooks,
            scheduling,
            time,
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            indexer,
            scheduler,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    pub fn indexer(&self) -> &Arc<IndexerService<G, S>> {
        &self.indexer
    }

    pub fn scheduler(&self) -> Option<&Arc<PaymentScheduler<G, S>>> {
        self.scheduler.as_ref()
    }

    /// Run the indexer startup sequence, then spawn the background loops.
    /// A startup failure is returned before anything is spawned.
    pub async fn start(&mut self) -> IndexerResult<StartupReport> {
        let report = self.indexer.start().await?;
        info!(
            "[sp-runtime] Indexer ready at slot {} ({} transactions backfilled)",
            report.tip, report.backfill.transactions
        );

        let indexer = self.indexer.clone();
        let shutdown = self.shutdown_rx.clone();
        self.spawn("live-listener", async move {
            if let Err(e) = indexer.run_live(shutdown).await {
                error!("[sp-runtime] Live listener stopped: {}", e);
            }
        });

        let indexer = self.indexer.clone();
        let shutdown = self.shutdown_rx.clone();
        self.spawn("full-sync", async move {
            indexer.run_full_sync_loop(shutdown).await;
        });

        if let Some(scheduler) = self.scheduler.clone() {
            let sweeper = scheduler.clone();
            let shutdown = self.shutdown_rx.clone();
            self.spawn("payment-sweep", async move {
                sweeper.run_sweep_loop(shutdown).await;
            });

            let shutdown = self.shutdown_rx.clone();
            self.spawn("maintenance", async move {
                scheduler.run_maintenance_loop(shutdown).await;
            });
        } else {
            warn!("[sp-runtime] Payment scheduler disabled, running index-only");
        }

        info!("[sp-runtime] {} tasks running", self.tasks.len());
        Ok(report)
    }

    fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.tasks.push((name, tokio::spawn(task)));
    }

    /// Names of tasks that have exited on their own.
    pub fn finished_tasks(&self) -> Vec<&'static str> {
        self.tasks
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Signal every task and wait up to [`SHUTDOWN_GRACE`] for each.
    pub async fn shutdown(self) {
        info!("[sp-runtime] Initiating graceful shutdown");
        let _ = self.shutdown_tx.send(true);

        for (name, handle) in self.tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => info!("[sp-runtime] {} stopped", name),
                Ok(Err(e)) => error!("[sp-runtime] {} panicked: {}", name, e),
                Err(_) => warn!("[sp-runtime] {} did not stop within {:?}", name, SHUTDOWN_GRACE),
            }
        }
        info!("[sp-runtime] Shutdown complete");
    }
}
