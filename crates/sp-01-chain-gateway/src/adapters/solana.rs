//! # Solana Gateway
//!
//! Production [`ChainGateway`]: reads through [`RpcClient`], streams logs
//! through [`LogSubscriber`] and signs payment transactions with the
//! configured fee payer.

use std::time::Instant;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use shared_types::{Address, Slot, TokenAmount};
use solana_signature::Signature;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::adapters::rpc::RpcClient;
use crate::adapters::ws::LogSubscriber;
use crate::config::GatewayConfig;
use crate::domain::accounts::{pda, AccountKind, ProtocolConfigAccount, SubscriptionWalletAccount};
use crate::domain::errors::{GatewayError, GatewayResult};
use crate::domain::transaction::{
    compile_message, execute_payment_instruction, message_bytes, serialize_transaction,
    PaymentAccounts,
};
use crate::domain::types::{
    AccountSnapshot, ConfirmedTransaction, LogStream, PaymentReceipt, PaymentRequest,
    SignatureInfo,
};
use crate::ports::inbound::ChainGateway;

/// Buffered log notifications before the subscriber applies backpressure.
const LOG_CHANNEL_CAPACITY: usize = 1024;

pub struct SolanaGateway {
    rpc: RpcClient,
    config: GatewayConfig,
    payer: Option<SigningKey>,
}

impl SolanaGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let rpc = RpcClient::new(&config.rpc_url, config.request_timeout, config.commitment)?;
        let payer = config
            .payer_secret_key
            .as_deref()
            .map(parse_keypair)
            .transpose()?;

        if let Some(payer) = &payer {
            info!(
                payer = %Address::new(payer.verifying_key().to_bytes()),
                "[sp-01] Payment signer loaded"
            );
        }

        Ok(Self { rpc, config, payer })
    }

    pub fn program_id(&self) -> &Address {
        &self.config.program_id
    }

    pub fn payer_address(&self) -> Option<Address> {
        self.payer
            .as_ref()
            .map(|key| Address::new(key.verifying_key().to_bytes()))
    }

    async fn fetch_required(&self, address: &Address) -> GatewayResult<AccountSnapshot> {
        self.rpc
            .get_account_info(address)
            .await?
            .ok_or(GatewayError::AccountNotFound(*address))
    }

    /// Resolve every account `execute_payment_from_wallet` needs.
    async fn resolve_payment_accounts(
        &self,
        request: &PaymentRequest,
    ) -> GatewayResult<PaymentAccounts> {
        let program_id = &self.config.program_id;

        let wallet_snapshot = self.fetch_required(&request.subscription_wallet).await?;
        let wallet = SubscriptionWalletAccount::decode(&wallet_snapshot.data)?;

        let protocol_config = pda::protocol_config(program_id)?;
        let protocol_snapshot = self.fetch_required(&protocol_config).await?;
        let protocol = ProtocolConfigAccount::decode(&protocol_snapshot.data)?;

        let merchant_token_account = Address::associated_token_address(
            &request.merchant,
            &request.mint,
            &self.config.token_program,
            &self.config.associated_token_program,
        )?;
        let protocol_treasury = Address::associated_token_address(
            &protocol.treasury,
            &request.mint,
            &self.config.token_program,
            &self.config.associated_token_program,
        )?;

        Ok(PaymentAccounts {
            subscription_state: request.subscription,
            subscription_wallet: request.subscription_wallet,
            merchant_plan: request.merchant_plan,
            protocol_config,
            wallet_token_account: wallet.main_token_account,
            merchant_token_account,
            protocol_treasury,
            // Yield redemption accounts are left to the program's `None` path.
            yield_vault: None,
            vault_buffer: None,
            kamino_reserve: None,
            token_program: self.config.token_program,
        })
    }

    async fn await_confirmation(&self, signature: &str) -> GatewayResult<Slot> {
        let started = Instant::now();
        loop {
            match self.rpc.get_signature_status(signature).await {
                Ok(Some(status)) => {
                    if let Some(err) = status.err {
                        return Err(GatewayError::TransactionRejected(err.to_string()));
                    }
                    let reached = status
                        .confirmation_status
                        .as_deref()
                        .map(|s| self.config.commitment.is_satisfied_by(s))
                        .unwrap_or(false);
                    if reached {
                        return Ok(status.slot);
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    debug!(error = %e, signature, "[sp-01] Status poll failed, retrying");
                }
                Err(e) => return Err(e),
            }

            if started.elapsed() >= self.config.confirm_timeout {
                return Err(GatewayError::ConfirmationTimeout(signature.to_string()));
            }
            tokio::time::sleep(self.config.confirm_poll_interval).await;
        }
    }
}

#[async_trait]
impl ChainGateway for SolanaGateway {
    async fn get_slot(&self) -> GatewayResult<Slot> {
        self.rpc.get_slot().await
    }

    async fn get_account(&self, address: &Address) -> GatewayResult<Option<AccountSnapshot>> {
        self.rpc.get_account_info(address).await
    }

    async fn get_signatures_for_address(
        &self,
        address: &Address,
        before: Option<&str>,
        limit: usize,
    ) -> GatewayResult<Vec<SignatureInfo>> {
        self.rpc
            .get_signatures_for_address(address, before, limit)
            .await
    }

    async fn get_transaction(
        &self,
        signature: &str,
    ) -> GatewayResult<Option<ConfirmedTransaction>> {
        self.rpc.get_transaction(signature).await
    }

    async fn get_program_accounts(
        &self,
        program_id: &Address,
        kind: AccountKind,
    ) -> GatewayResult<Vec<AccountSnapshot>> {
        self.rpc
            .get_program_accounts(program_id, &kind.discriminator())
            .await
    }

    async fn get_token_balance(&self, token_account: &Address) -> GatewayResult<TokenAmount> {
        self.rpc.get_token_account_balance(token_account).await
    }

    async fn subscribe_logs(&self, program_id: &Address) -> GatewayResult<LogStream> {
        let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        LogSubscriber::new(&self.config.ws_url, *program_id, self.config.commitment).spawn(tx);
        Ok(rx)
    }

    async fn submit_payment(&self, request: &PaymentRequest) -> GatewayResult<PaymentReceipt> {
        let payer = self
            .payer
            .as_ref()
            .ok_or_else(|| GatewayError::InvalidKeypair("no payer keypair configured".into()))?;
        let payer_address = Address::new(payer.verifying_key().to_bytes());

        let accounts = self.resolve_payment_accounts(request).await?;
        let instruction = execute_payment_instruction(&self.config.program_id, &accounts);
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let message = compile_message(&payer_address, &[instruction], &blockhash);
        let signature = Signature::from(payer.sign(&message_bytes(&message)?).to_bytes());
        let wire = serialize_transaction(vec![signature], &message)?;

        let signature = self.rpc.send_transaction(&wire).await?;
        debug!(
            signature = %signature,
            subscription = %request.subscription,
            "[sp-01] Payment submitted"
        );

        match self.await_confirmation(&signature).await {
            Ok(slot) => Ok(PaymentReceipt {
                signature,
                slot: Some(slot),
            }),
            Err(e) => {
                warn!(signature = %signature, error = %e, "[sp-01] Payment not confirmed");
                Err(e)
            }
        }
    }
}

/// Parse a keypair given as a JSON array of 64 bytes (secret || public).
pub fn parse_keypair(json: &str) -> GatewayResult<SigningKey> {
    let bytes: Vec<u8> = serde_json::from_str(json.trim())
        .map_err(|e| GatewayError::InvalidKeypair(format!("not a JSON byte array: {}", e)))?;
    let bytes: [u8; 64] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| {
            GatewayError::InvalidKeypair(format!("expected 64 bytes, got {}", b.len()))
        })?;
    SigningKey::from_keypair_bytes(&bytes)
        .map_err(|e| GatewayError::InvalidKeypair(e.to_string()))
}
