//! # Transaction Assembly
//!
//! Builds the payment instruction and the legacy transaction that carries
//! it. Key ordering and header counts come from [`Message`]; the wire form
//! is the short-vec of signatures followed by the message, serialized with
//! bincode.

use serde::Serialize;
use shared_types::layout::instruction_discriminator;
use shared_types::Address;
use solana_hash::Hash;
use solana_instruction::{AccountMeta, Instruction};
use solana_message::Message;
use solana_signature::Signature;

use crate::domain::errors::GatewayResult;

pub const EXECUTE_PAYMENT_IX: &str = "execute_payment_from_wallet";

/// Fully resolved accounts for `execute_payment_from_wallet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAccounts {
    pub subscription_state: Address,
    pub subscription_wallet: Address,
    pub merchant_plan: Address,
    pub protocol_config: Address,
    pub wallet_token_account: Address,
    pub merchant_token_account: Address,
    pub protocol_treasury: Address,
    pub yield_vault: Option<Address>,
    pub vault_buffer: Option<Address>,
    pub kamino_reserve: Option<Address>,
    pub token_program: Address,
}

/// Build the payment instruction. Absent optional accounts are passed as
/// the program id, which is how the program reads `None`.
pub fn execute_payment_instruction(
    program_id: &Address,
    accounts: &PaymentAccounts,
) -> Instruction {
    let program = program_id.to_pubkey();
    let optional = |address: Option<Address>| match address {
        Some(address) => AccountMeta::new(address.to_pubkey(), false),
        None => AccountMeta::new_readonly(program, false),
    };
    Instruction::new_with_bytes(
        program,
        &instruction_discriminator(EXECUTE_PAYMENT_IX),
        vec![
            AccountMeta::new(accounts.subscription_state.to_pubkey(), false),
            AccountMeta::new(accounts.subscription_wallet.to_pubkey(), false),
            AccountMeta::new_readonly(accounts.merchant_plan.to_pubkey(), false),
            AccountMeta::new_readonly(accounts.protocol_config.to_pubkey(), false),
            AccountMeta::new(accounts.wallet_token_account.to_pubkey(), false),
            AccountMeta::new(accounts.merchant_token_account.to_pubkey(), false),
            AccountMeta::new(accounts.protocol_treasury.to_pubkey(), false),
            optional(accounts.yield_vault),
            optional(accounts.vault_buffer),
            AccountMeta::new_readonly(
                accounts.kamino_reserve.map_or(program, Address::to_pubkey),
                false,
            ),
            AccountMeta::new_readonly(accounts.token_program.to_pubkey(), false),
        ],
    )
}

/// Compile a legacy message with `payer` as fee payer and only signer.
pub fn compile_message(
    payer: &Address,
    instructions: &[Instruction],
    recent_blockhash: &Hash,
) -> Message {
    Message::new_with_blockhash(instructions, Some(&payer.to_pubkey()), recent_blockhash)
}

/// The bytes a signer signs.
pub fn message_bytes(message: &Message) -> GatewayResult<Vec<u8>> {
    Ok(bincode::serialize(message)?)
}

#[derive(Serialize)]
struct WireTransaction<'a> {
    #[serde(with = "solana_short_vec")]
    signatures: Vec<Signature>,
    message: &'a Message,
}

/// Serialize a signed transaction for `sendTransaction`.
pub fn serialize_transaction(
    signatures: Vec<Signature>,
    message: &Message,
) -> GatewayResult<Vec<u8>> {
    Ok(bincode::serialize(&WireTransaction {
        signatures,
        message,
    })?)
}
