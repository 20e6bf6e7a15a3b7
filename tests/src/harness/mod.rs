//! # Deployment Harness
//!
//! One [`Deployment`] is the full service (indexer, scheduler, webhook
//! notifier, read services) over an in-memory store, pointed at a
//! [`SimulatedChain`] and a [`WebhookOutbox`], with a shared mock clock.
//!
//! Scenarios drive the loops by hand (`catch_up`, `sweep`, `full_sync`)
//! so every step is deterministic; the runtime scenarios spawn the real
//! tasks instead.

pub mod chain;
pub mod outbox;

use std::sync::Arc;
use std::time::Duration;

use shared_types::{Address, MockTimeSource, TimeSource};
use sp_01_chain_gateway::GatewayConfig;
use sp_03_ledger_store::{InMemoryKVStore, LedgerStore, Merchant};
use sp_04_indexer::{
    BackfillReport, IndexerConfig, IndexerService, StartupReport, SyncOutcome, SyncReport,
};
use sp_05_payment_scheduler::{PaymentScheduler, SchedulerConfig, SweepOutcome, SweepReport};
use sp_06_webhook_notifier::WebhookConfig;
use sp_07_read_services::{MerchantApi, ReadService, RegisterMerchant};
use sp_runtime::{Runtime, RuntimeConfig, StoreBackend, StoreConfig};
use sp_telemetry::TelemetryConfig;

pub use chain::{program_id, SimulatedChain, GENESIS_SLOT};
pub use outbox::WebhookOutbox;

pub const T0: i64 = 1_700_000_000;
pub const FEE: u64 = 1_000_000;
pub const MONTH: i64 = 2_592_000;
pub const RETRY_DELAY: i64 = 300;
pub const MAX_RETRIES: u32 = 3;
pub const WEBHOOK_URL: &str = "https://merchant.example/webhooks";

pub type Store = LedgerStore<InMemoryKVStore>;

pub struct Deployment {
    pub clock: Arc<MockTimeSource>,
    pub chain: Arc<SimulatedChain>,
    pub store: Arc<Store>,
    pub outbox: Arc<WebhookOutbox>,
    pub runtime: Runtime<SimulatedChain, Store>,
}

impl Deployment {
    pub fn new() -> Self {
        let clock = Arc::new(MockTimeSource::new(T0));
        let chain = Arc::new(SimulatedChain::new(clock.clone()));
        let store = Arc::new(LedgerStore::in_memory_with_clock(clock.clone()));
        let outbox = Arc::new(WebhookOutbox::default());
        Self::assemble(clock, chain, store, outbox)
    }

    fn assemble(
        clock: Arc<MockTimeSource>,
        chain: Arc<SimulatedChain>,
        store: Arc<Store>,
        outbox: Arc<WebhookOutbox>,
    ) -> Self {
        let time: Arc<dyn TimeSource> = clock.clone();
        let runtime = Runtime::new(
            &runtime_config(),
            chain.clone(),
            store.clone(),
            outbox.clone(),
            time,
        );
        Self {
            clock,
            chain,
            store,
            outbox,
            runtime,
        }
    }

    /// Stop this process and start a new one on the same store, chain and
    /// webhook endpoint.
    pub async fn restart(self) -> Self {
        let Self {
            clock,
            chain,
            store,
            outbox,
            runtime,
        } = self;
        runtime.shutdown().await;
        Self::assemble(clock, chain, store, outbox)
    }

    pub fn indexer(&self) -> &IndexerService<SimulatedChain, Store> {
        self.runtime.indexer()
    }

    pub fn scheduler(&self) -> &PaymentScheduler<SimulatedChain, Store> {
        self.runtime.scheduler().expect("scheduler enabled")
    }

    pub fn reads(&self) -> ReadService<Store> {
        ReadService::new(self.store.clone(), self.clock.clone())
    }

    /// Indexer startup sequence only, no background tasks.
    pub async fn boot(&self) -> StartupReport {
        self.indexer().start().await.expect("startup")
    }

    /// Index everything that landed since the checkpoint.
    pub async fn catch_up(&self) -> BackfillReport {
        self.indexer().backfill().await.expect("backfill")
    }

    pub async fn full_sync(&self) -> SyncReport {
        match self.indexer().full_sync().await.expect("full sync") {
            SyncOutcome::Completed(report) => report,
            SyncOutcome::Skipped => panic!("full sync unexpectedly skipped"),
        }
    }

    pub async fn sweep(&self) -> SweepReport {
        match self.scheduler().sweep().await.expect("sweep") {
            SweepOutcome::Completed(report) => report,
            SweepOutcome::Skipped => panic!("sweep unexpectedly skipped"),
        }
    }

    /// Register `wallet` as a merchant with a webhook endpoint.
    pub fn register_merchant(&self, wallet: Address) -> Merchant {
        self.reads()
            .register_merchant(RegisterMerchant {
                wallet,
                company_name: Some("Acme Streaming".to_string()),
                webhook_url: Some(WEBHOOK_URL.to_string()),
                ..Default::default()
            })
            .expect("register merchant")
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::new()
    }
}

/// A merchant with one monthly plan at [`FEE`] and one subscriber whose
/// wallet holds `balance`, all indexed. Create it after [`Deployment::boot`];
/// a first boot starts at the tip and would skip earlier history.
pub struct Fixture {
    pub merchant: Address,
    pub secret: String,
    pub plan: Address,
    pub user: Address,
    pub wallet: Address,
    pub subscription: Address,
}

impl Fixture {
    pub async fn subscribe(deployment: &Deployment, balance: u64) -> Self {
        let chain = &deployment.chain;
        let merchant = chain.fresh_address(0x40);
        let user = chain.fresh_address(0x50);
        let secret = deployment.register_merchant(merchant).webhook_secret;

        let plan = chain.register_plan(merchant, "pro", FEE, MONTH);
        let wallet = chain.create_wallet(user, balance);
        let subscription = chain.subscribe(user, wallet, plan);
        deployment.catch_up().await;

        Self {
            merchant,
            secret,
            plan,
            user,
            wallet,
            subscription,
        }
    }
}

/// Test configuration: fixed 300s retries, no inter-payment delay, in-memory
/// store, scheduler enabled.
pub fn runtime_config() -> RuntimeConfig {
    let program = program_id();
    let mut gateway =
        GatewayConfig::new("http://127.0.0.1:8899", program).expect("gateway config");
    gateway.payer_secret_key = Some("simulated".to_string());
    gateway.confirm_timeout = Duration::from_secs(1);
    RuntimeConfig {
        gateway,
        indexer: IndexerConfig::for_testing(program),
        scheduler: SchedulerConfig::for_testing(),
        webhook: WebhookConfig::default(),
        store: StoreConfig {
            backend: StoreBackend::Memory,
            data_dir: std::env::temp_dir(),
        },
        telemetry: TelemetryConfig::default(),
        scheduler_enabled: true,
    }
}
