//! # Simulated Chain
//!
//! An in-process cluster running a faithful subset of the subscription
//! program: plan registration, wallet creation, subscribe, cancel and the
//! payment instruction with its due-date and balance checks. Every
//! instruction emits its program event as a `Program data:` log line,
//! lands in the signature history and, while live delivery is on, is
//! pushed to the open log subscription.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Address, MockTimeSource, Slot, TimeSource, TokenAmount, YieldStrategy};
use sp_01_chain_gateway::{
    AccountKind, AccountSnapshot, ChainGateway, ConfirmedTransaction, GatewayError,
    GatewayResult, LogNotification, LogStream, MerchantPlanAccount, PaymentReceipt,
    PaymentRequest, SignatureInfo, SubscriptionStateAccount, SubscriptionWalletAccount,
};
use sp_02_event_parser::{
    EventParser, MerchantPlanRegistered, PaymentExecuted, ProgramEvent, SubscriptionCancelled,
    SubscriptionCreated, SubscriptionWalletCreated,
};
use tokio::sync::mpsc;

pub const GENESIS_SLOT: Slot = 1_000;

/// Protocol fee the simulated program withholds, in basis points.
pub const PROTOCOL_FEE_BPS: u64 = 100;

pub fn program_id() -> Address {
    Address::new([0xA0; 32])
}

struct ChainState {
    slot: Slot,
    accounts: HashMap<Address, AccountSnapshot>,
    token_balances: HashMap<Address, u64>,
    /// Newest first, like the RPC node.
    signatures: Vec<SignatureInfo>,
    transactions: HashMap<String, ConfirmedTransaction>,
    live: Option<mpsc::Sender<LogNotification>>,
    live_enabled: bool,
    rpc_outage: bool,
    next_address: u32,
    next_signature: u32,
    payments_landed: usize,
}

pub struct SimulatedChain {
    state: Mutex<ChainState>,
    parser: EventParser,
    clock: Arc<MockTimeSource>,
}

impl SimulatedChain {
    pub fn new(clock: Arc<MockTimeSource>) -> Self {
        let chain = Self {
            state: Mutex::new(ChainState {
                slot: GENESIS_SLOT,
                accounts: HashMap::new(),
                token_balances: HashMap::new(),
                signatures: Vec::new(),
                transactions: HashMap::new(),
                live: None,
                live_enabled: true,
                rpc_outage: false,
                next_address: 0,
                next_signature: 0,
                payments_landed: 0,
            }),
            parser: EventParser::new(&program_id()),
            clock,
        };
        let program = program_id();
        chain.state.lock().accounts.insert(
            program,
            AccountSnapshot {
                address: program,
                owner: Address::default(),
                lamports: 1,
                executable: true,
                data: Vec::new(),
            },
        );
        chain
    }

    /// A new unique address. `tag` keeps addresses of one kind recognizable
    /// in failure output.
    pub fn fresh_address(&self, tag: u8) -> Address {
        let mut state = self.state.lock();
        state.next_address += 1;
        let mut bytes = [tag; 32];
        bytes[28..].copy_from_slice(&state.next_address.to_be_bytes());
        Address::new(bytes)
    }

    pub fn slot(&self) -> Slot {
        self.state.lock().slot
    }

    /// Let `slots` pass without program activity.
    pub fn advance_slots(&self, slots: u64) {
        self.state.lock().slot += slots;
    }

    /// While off, transactions still land but are not pushed to the log
    /// subscription.
    pub fn set_live_delivery(&self, enabled: bool) {
        self.state.lock().live_enabled = enabled;
    }

    pub fn has_live_subscriber(&self) -> bool {
        self.state
            .lock()
            .live
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }

    /// Payment submissions fail with a timeout while on.
    pub fn set_rpc_outage(&self, down: bool) {
        self.state.lock().rpc_outage = down;
    }

    pub fn payments_landed(&self) -> usize {
        self.state.lock().payments_landed
    }

    pub fn transaction_count(&self) -> usize {
        self.state.lock().signatures.len()
    }

    // -------------------------------------------------------------------------
    // Instructions
    // -------------------------------------------------------------------------

    pub fn register_plan(
        &self,
        merchant: Address,
        plan_id: &str,
        fee: u64,
        interval: i64,
    ) -> Address {
        let plan = self.fresh_address(0x10);
        let account = MerchantPlanAccount {
            merchant,
            mint: usdc_mint(),
            plan_id: plan_id.to_string(),
            plan_name: plan_id.to_uppercase(),
            fee_amount: fee,
            payment_interval: interval,
            is_active: true,
            total_subscribers: 0,
            bump: 255,
        };
        let mut state = self.state.lock();
        put_account(&mut state, plan, account.encode().unwrap());
        self.emit(
            &mut state,
            vec![ProgramEvent::MerchantPlanRegistered(MerchantPlanRegistered {
                plan_pda: plan,
            })],
        );
        plan
    }

    /// Create a subscription wallet whose token account holds `balance`.
    pub fn create_wallet(&self, owner: Address, balance: u64) -> Address {
        let wallet = self.fresh_address(0x20);
        let token_account = self.fresh_address(0x21);
        let account = SubscriptionWalletAccount {
            owner,
            main_token_account: token_account,
            mint: usdc_mint(),
            yield_vault: Address::default(),
            yield_strategy: YieldStrategy::None,
            is_yield_enabled: false,
            total_subscriptions: 0,
            total_spent: 0,
            yield_shares: 0,
            bump: 254,
        };
        let mut state = self.state.lock();
        put_account(&mut state, wallet, account.encode().unwrap());
        state.token_balances.insert(token_account, balance);
        self.emit(
            &mut state,
            vec![ProgramEvent::SubscriptionWalletCreated(SubscriptionWalletCreated {
                wallet_pda: wallet,
                owner,
                mint: usdc_mint(),
            })],
        );
        wallet
    }

    /// Subscribe `wallet` to `plan`. The first payment is due one interval
    /// after the current clock.
    pub fn subscribe(&self, user: Address, wallet: Address, plan: Address) -> Address {
        let subscription = self.fresh_address(0x30);
        let now = self.clock.now();
        let mut state = self.state.lock();

        let mut plan_account = plan_state(&state, &plan);
        plan_account.total_subscribers += 1;
        put_account(&mut state, plan, plan_account.encode().unwrap());

        let mut wallet_account = wallet_state(&state, &wallet);
        wallet_account.total_subscriptions += 1;
        put_account(&mut state, wallet, wallet_account.encode().unwrap());

        let account = SubscriptionStateAccount {
            user,
            subscription_wallet: wallet,
            merchant: plan_account.merchant,
            mint: plan_account.mint,
            merchant_plan: plan,
            fee_amount: plan_account.fee_amount,
            payment_interval: plan_account.payment_interval,
            last_payment_timestamp: now,
            total_paid: 0,
            payment_count: 0,
            is_active: true,
            session_token: String::new(),
            bump: 253,
        };
        put_account(&mut state, subscription, account.encode().unwrap());
        self.emit(
            &mut state,
            vec![ProgramEvent::SubscriptionCreated(SubscriptionCreated {
                subscription_pda: subscription,
                user,
                wallet,
                merchant: plan_account.merchant,
                plan_id: plan_account.plan_id,
                session_token: String::new(),
            })],
        );
        subscription
    }

    pub fn cancel(&self, subscription: Address) -> String {
        let mut state = self.state.lock();
        let mut account = subscription_state(&state, &subscription);
        account.is_active = false;
        put_account(&mut state, subscription, account.encode().unwrap());

        let mut wallet = wallet_state(&state, &account.subscription_wallet);
        wallet.total_subscriptions = wallet.total_subscriptions.saturating_sub(1);
        put_account(&mut state, account.subscription_wallet, wallet.encode().unwrap());

        let (signature, _) = self.emit(
            &mut state,
            vec![ProgramEvent::SubscriptionCancelled(SubscriptionCancelled {
                subscription_pda: subscription,
                wallet_pda: account.subscription_wallet,
                user: account.user,
                merchant: account.merchant,
                payments_made: account.payment_count,
            })],
        );
        signature
    }

    /// Remove an account without any program event, as a closed account
    /// looks to a full sync.
    pub fn close_account(&self, address: &Address) {
        self.state.lock().accounts.remove(address);
    }

    pub fn fund(&self, wallet: &Address, amount: u64) {
        let mut state = self.state.lock();
        let token_account = wallet_state(&state, wallet).main_token_account;
        *state.token_balances.entry(token_account).or_default() += amount;
    }

    pub fn token_balance(&self, wallet: &Address) -> u64 {
        let state = self.state.lock();
        let token_account = wallet_state(&state, wallet).main_token_account;
        state.token_balances.get(&token_account).copied().unwrap_or(0)
    }

    pub fn subscription(&self, address: &Address) -> SubscriptionStateAccount {
        subscription_state(&self.state.lock(), address)
    }

    /// Land a transaction carrying `events` and return its signature and
    /// slot.
    fn emit(&self, state: &mut ChainState, events: Vec<ProgramEvent>) -> (String, Slot) {
        state.slot += 1;
        state.next_signature += 1;
        let signature = format!("sim{:06}", state.next_signature);
        let slot = state.slot;
        let block_time = Some(self.clock.now());
        let logs = self.parser.to_log_lines(&events).unwrap();

        state.signatures.insert(
            0,
            SignatureInfo {
                signature: signature.clone(),
                slot,
                block_time,
                failed: false,
            },
        );
        state.transactions.insert(
            signature.clone(),
            ConfirmedTransaction {
                signature: signature.clone(),
                slot,
                block_time,
                log_messages: logs.clone(),
                failed: false,
            },
        );
        if state.live_enabled {
            if let Some(sender) = &state.live {
                let _ = sender.try_send(LogNotification {
                    signature: signature.clone(),
                    slot,
                    logs,
                    failed: false,
                });
            }
        }
        (signature, slot)
    }

    /// The payment instruction: checks, transfer, account updates, event.
    fn execute_payment(&self, request: &PaymentRequest) -> GatewayResult<PaymentReceipt> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        if state.rpc_outage {
            return Err(GatewayError::Timeout("sendTransaction".to_string()));
        }

        let mut account = state
            .accounts
            .get(&request.subscription)
            .map(|a| SubscriptionStateAccount::decode(&a.data))
            .transpose()?
            .ok_or(GatewayError::AccountNotFound(request.subscription))?;
        if !account.is_active {
            return Err(GatewayError::TransactionRejected(
                "SubscriptionInactive".to_string(),
            ));
        }
        if now < account.next_due_at() {
            return Err(GatewayError::TransactionRejected("PaymentNotDue".to_string()));
        }

        let mut wallet = wallet_state(&state, &account.subscription_wallet);
        let balance = state
            .token_balances
            .get(&wallet.main_token_account)
            .copied()
            .unwrap_or(0);
        if balance < account.fee_amount {
            return Err(GatewayError::TransactionRejected(
                "InsufficientBalance".to_string(),
            ));
        }
        state
            .token_balances
            .insert(wallet.main_token_account, balance - account.fee_amount);

        account.last_payment_timestamp = now;
        account.payment_count += 1;
        account.total_paid += account.fee_amount;
        put_account(&mut state, request.subscription, account.encode().unwrap());
        wallet.total_spent += account.fee_amount;
        put_account(&mut state, account.subscription_wallet, wallet.encode().unwrap());

        let protocol_fee = account.fee_amount * PROTOCOL_FEE_BPS / 10_000;
        let (signature, slot) = self.emit(
            &mut state,
            vec![ProgramEvent::PaymentExecuted(PaymentExecuted {
                subscription_pda: request.subscription,
                wallet_pda: account.subscription_wallet,
                user: account.user,
                merchant: account.merchant,
                amount: account.fee_amount,
                protocol_fee,
                merchant_received: account.fee_amount - protocol_fee,
                payment_number: account.payment_count,
            })],
        );
        state.payments_landed += 1;
        Ok(PaymentReceipt {
            signature,
            slot: Some(slot),
        })
    }
}

pub fn usdc_mint() -> Address {
    Address::new([0xC0; 32])
}

fn put_account(state: &mut ChainState, address: Address, data: Vec<u8>) {
    state.accounts.insert(
        address,
        AccountSnapshot {
            address,
            owner: program_id(),
            lamports: 2_000_000,
            executable: false,
            data,
        },
    );
}

fn plan_state(state: &ChainState, address: &Address) -> MerchantPlanAccount {
    MerchantPlanAccount::decode(&state.accounts[address].data).unwrap()
}

fn wallet_state(state: &ChainState, address: &Address) -> SubscriptionWalletAccount {
    SubscriptionWalletAccount::decode(&state.accounts[address].data).unwrap()
}

fn subscription_state(state: &ChainState, address: &Address) -> SubscriptionStateAccount {
    SubscriptionStateAccount::decode(&state.accounts[address].data).unwrap()
}

#[async_trait]
impl ChainGateway for SimulatedChain {
    async fn get_slot(&self) -> GatewayResult<Slot> {
        Ok(self.slot())
    }

    async fn get_account(&self, address: &Address) -> GatewayResult<Option<AccountSnapshot>> {
        Ok(self.state.lock().accounts.get(address).cloned())
    }

    async fn get_signatures_for_address(
        &self,
        _address: &Address,
        before: Option<&str>,
        limit: usize,
    ) -> GatewayResult<Vec<SignatureInfo>> {
        let state = self.state.lock();
        let start = match before {
            Some(signature) => state
                .signatures
                .iter()
                .position(|info| info.signature == signature)
                .map(|i| i + 1)
                .unwrap_or(state.signatures.len()),
            None => 0,
        };
        Ok(state.signatures.iter().skip(start).take(limit).cloned().collect())
    }

    async fn get_transaction(
        &self,
        signature: &str,
    ) -> GatewayResult<Option<ConfirmedTransaction>> {
        Ok(self.state.lock().transactions.get(signature).cloned())
    }

    async fn get_program_accounts(
        &self,
        _program_id: &Address,
        kind: AccountKind,
    ) -> GatewayResult<Vec<AccountSnapshot>> {
        let discriminator = kind.discriminator();
        let mut accounts: Vec<AccountSnapshot> = self
            .state
            .lock()
            .accounts
            .values()
            .filter(|a| a.data.starts_with(&discriminator))
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.address);
        Ok(accounts)
    }

    async fn get_token_balance(&self, token_account: &Address) -> GatewayResult<TokenAmount> {
        self.state
            .lock()
            .token_balances
            .get(token_account)
            .map(|balance| TokenAmount::from_u64(*balance))
            .ok_or(GatewayError::AccountNotFound(*token_account))
    }

    async fn subscribe_logs(&self, _program_id: &Address) -> GatewayResult<LogStream> {
        let (sender, receiver) = mpsc::channel(64);
        self.state.lock().live = Some(sender);
        Ok(receiver)
    }

    async fn submit_payment(&self, request: &PaymentRequest) -> GatewayResult<PaymentReceipt> {
        self.execute_payment(request)
    }
}
