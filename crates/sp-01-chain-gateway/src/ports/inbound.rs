//! # Inbound Ports (Driving Ports)
//!
//! The chain access API consumed by the indexer and the payment scheduler.
//! All reads use the configured commitment level ("confirmed" by default).

use async_trait::async_trait;
use shared_types::{Address, Slot, TokenAmount};

use crate::domain::accounts::AccountKind;
use crate::domain::errors::GatewayResult;
use crate::domain::types::{
    AccountSnapshot, ConfirmedTransaction, LogStream, PaymentReceipt, PaymentRequest,
    SignatureInfo,
};

#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Current slot. Doubles as the connectivity probe at startup.
    async fn get_slot(&self) -> GatewayResult<Slot>;

    /// Fetch one account, `None` when it does not exist (closed accounts).
    async fn get_account(&self, address: &Address) -> GatewayResult<Option<AccountSnapshot>>;

    /// One page of signatures mentioning `address`, newest first, starting
    /// strictly before `before` when given.
    async fn get_signatures_for_address(
        &self,
        address: &Address,
        before: Option<&str>,
        limit: usize,
    ) -> GatewayResult<Vec<SignatureInfo>>;

    /// Fetch a transaction with its log messages, `None` if the node does
    /// not know it.
    async fn get_transaction(&self, signature: &str)
        -> GatewayResult<Option<ConfirmedTransaction>>;

    /// All accounts of one type owned by `program_id`.
    async fn get_program_accounts(
        &self,
        program_id: &Address,
        kind: AccountKind,
    ) -> GatewayResult<Vec<AccountSnapshot>>;

    /// Token balance of an SPL token account in the smallest unit.
    async fn get_token_balance(&self, token_account: &Address) -> GatewayResult<TokenAmount>;

    /// Start a live log subscription for transactions mentioning `program_id`.
    async fn subscribe_logs(&self, program_id: &Address) -> GatewayResult<LogStream>;

    /// Build, sign and submit the payment instruction, then wait for
    /// confirmation.
    async fn submit_payment(&self, request: &PaymentRequest) -> GatewayResult<PaymentReceipt>;
}

