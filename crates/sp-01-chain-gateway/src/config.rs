//! Gateway configuration from environment variables.

use std::env;
use std::fmt;
use std::time::Duration;

use shared_types::Address;

use crate::domain::errors::{GatewayError, GatewayResult};
use crate::domain::types::Commitment;

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

#[derive(Clone)]
pub struct GatewayConfig {
    pub rpc_url: String,
    pub ws_url: String,
    pub program_id: Address,
    pub commitment: Commitment,
    pub request_timeout: Duration,
    /// How long to poll for a submitted payment to reach `commitment`.
    pub confirm_timeout: Duration,
    pub confirm_poll_interval: Duration,
    /// JSON array of the 64 keypair bytes. Without it the gateway is
    /// read-only and payment submission fails.
    pub payer_secret_key: Option<String>,
    pub token_program: Address,
    pub associated_token_program: Address,
}

impl GatewayConfig {
    pub fn new(rpc_url: impl Into<String>, program_id: Address) -> GatewayResult<Self> {
        let rpc_url = rpc_url.into();
        Ok(Self {
            ws_url: derive_ws_url(&rpc_url),
            rpc_url,
            program_id,
            commitment: Commitment::Confirmed,
            request_timeout: Duration::from_secs(30),
            confirm_timeout: Duration::from_secs(60),
            confirm_poll_interval: Duration::from_millis(500),
            payer_secret_key: None,
            token_program: parse_address("token program", TOKEN_PROGRAM_ID)?,
            associated_token_program: parse_address(
                "associated token program",
                ASSOCIATED_TOKEN_PROGRAM_ID,
            )?,
        })
    }

    /// Create configuration from environment variables.
    ///
    /// - `PROGRAM_ID` (required): subscription program address
    /// - `SOLANA_RPC_URL`: HTTP endpoint (default: devnet)
    /// - `SOLANA_WS_URL`: WebSocket endpoint (default: derived from the RPC URL)
    /// - `SOLANA_COMMITMENT`: processed / confirmed / finalized (default: confirmed)
    /// - `SP_RPC_TIMEOUT_SECS`: per-request timeout (default: 30)
    /// - `SP_CONFIRM_TIMEOUT_SECS`: payment confirmation wait (default: 60)
    /// - `PAYER_SECRET_KEY`: JSON byte array of the fee payer keypair
    pub fn from_env() -> GatewayResult<Self> {
        let program_id = env::var("PROGRAM_ID")
            .map_err(|_| GatewayError::Config("PROGRAM_ID is not set".to_string()))?;
        let program_id = parse_address("PROGRAM_ID", &program_id)?;

        let rpc_url = env::var("SOLANA_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
        let mut config = Self::new(rpc_url, program_id)?;

        if let Ok(ws_url) = env::var("SOLANA_WS_URL") {
            config.ws_url = ws_url;
        }
        if let Ok(level) = env::var("SOLANA_COMMITMENT") {
            config.commitment = level.parse().map_err(GatewayError::Config)?;
        }
        if let Some(secs) = env_secs("SP_RPC_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_secs("SP_CONFIRM_TIMEOUT_SECS") {
            config.confirm_timeout = Duration::from_secs(secs);
        }
        config.payer_secret_key = env::var("PAYER_SECRET_KEY").ok().filter(|s| !s.is_empty());

        Ok(config)
    }
}

// The secret key must never end up in logs.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("rpc_url", &self.rpc_url)
            .field("ws_url", &self.ws_url)
            .field("program_id", &self.program_id)
            .field("commitment", &self.commitment)
            .field("request_timeout", &self.request_timeout)
            .field("confirm_timeout", &self.confirm_timeout)
            .field(
                "payer_secret_key",
                &self.payer_secret_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn parse_address(name: &str, value: &str) -> GatewayResult<Address> {
    value
        .parse()
        .map_err(|e| GatewayError::Config(format!("{}: {}", name, e)))
}

fn env_secs(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

/// `https://host` becomes `wss://host`, `http://host` becomes `ws://host`.
pub fn derive_ws_url(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        rpc_url.to_string()
    }
}
