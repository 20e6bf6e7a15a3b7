//! # JSON-RPC Client
//!
//! Thin typed wrapper over the cluster's HTTP JSON-RPC endpoint. Each method
//! maps one RPC call to gateway domain types; no retries happen here.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{Address, Discriminator, TokenAmount, TxSignature};
use solana_hash::Hash;
use tracing::trace;

use crate::domain::errors::{GatewayError, GatewayResult, RPC_PREFLIGHT_FAILURE};
use crate::domain::types::{AccountSnapshot, Commitment, ConfirmedTransaction, SignatureInfo};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<P> {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: P,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcAccount {
    data: (String, String),
    owner: String,
    lamports: u64,
    #[serde(default)]
    executable: bool,
}

#[derive(Debug, Deserialize)]
struct RpcKeyedAccount {
    pubkey: String,
    account: RpcAccount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignatureInfo {
    signature: String,
    slot: u64,
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    block_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransactionMeta {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    log_messages: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    slot: u64,
    #[serde(default)]
    block_time: Option<i64>,
    #[serde(default)]
    meta: Option<RpcTransactionMeta>,
}

#[derive(Debug, Deserialize)]
struct RpcTokenAmount {
    amount: String,
}

#[derive(Debug, Deserialize)]
struct RpcBlockhash {
    blockhash: String,
}

/// Status of a submitted signature.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

pub struct RpcClient {
    client: Client,
    url: String,
    commitment: Commitment,
    request_id: AtomicU64,
}

impl RpcClient {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        commitment: Commitment,
    ) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(GatewayError::Http)?;

        Ok(Self {
            client,
            url: url.into(),
            commitment,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a JSON-RPC method. A `null` result deserializes into `R` as-is,
    /// so callers expecting "not found" ask for an `Option`.
    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> GatewayResult<R> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id(),
            method: method.to_string(),
            params,
        };
        trace!(method, id = request.id, "[sp-01] RPC call");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GatewayError::Connection(self.url.clone())
                } else if e.is_timeout() {
                    GatewayError::Timeout(method.to_string())
                } else {
                    GatewayError::Http(e)
                }
            })?;

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(map_rpc_error(error));
        }

        serde_json::from_value(rpc_response.result.unwrap_or(Value::Null))
            .map_err(|e| GatewayError::Parse(format!("{}: {}", method, e)))
    }

    fn read_config(&self) -> Value {
        json!({ "commitment": self.commitment.as_str() })
    }

    pub async fn get_slot(&self) -> GatewayResult<u64> {
        self.call("getSlot", json!([self.read_config()])).await
    }

    pub async fn get_account_info(
        &self,
        address: &Address,
    ) -> GatewayResult<Option<AccountSnapshot>> {
        let params = json!([
            address.to_string(),
            { "encoding": "base64", "commitment": self.commitment.as_str() }
        ]);
        let response: WithContext<Option<RpcAccount>> = self.call("getAccountInfo", params).await?;
        response
            .value
            .map(|account| to_snapshot(*address, account))
            .transpose()
    }

    pub async fn get_signatures_for_address(
        &self,
        address: &Address,
        before: Option<&str>,
        limit: usize,
    ) -> GatewayResult<Vec<SignatureInfo>> {
        let mut config = json!({
            "limit": limit,
            "commitment": self.commitment.as_str(),
        });
        if let Some(before) = before {
            config["before"] = json!(before);
        }
        let page: Vec<RpcSignatureInfo> = self
            .call("getSignaturesForAddress", json!([address.to_string(), config]))
            .await?;
        Ok(page
            .into_iter()
            .map(|info| SignatureInfo {
                signature: info.signature,
                slot: info.slot,
                block_time: info.block_time,
                failed: info.err.is_some(),
            })
            .collect())
    }

    pub async fn get_transaction(
        &self,
        signature: &str,
    ) -> GatewayResult<Option<ConfirmedTransaction>> {
        let params = json!([
            signature,
            {
                "encoding": "json",
                "commitment": self.commitment.as_str(),
                "maxSupportedTransactionVersion": 0
            }
        ]);
        let tx: Option<RpcTransaction> = self.call("getTransaction", params).await?;
        Ok(tx.map(|tx| {
            let (failed, logs) = match tx.meta {
                Some(meta) => (meta.err.is_some(), meta.log_messages.unwrap_or_default()),
                None => (false, Vec::new()),
            };
            ConfirmedTransaction {
                signature: signature.to_string(),
                slot: tx.slot,
                block_time: tx.block_time,
                log_messages: logs,
                failed,
            }
        }))
    }

    /// Program accounts whose data starts with `discriminator`.
    pub async fn get_program_accounts(
        &self,
        program_id: &Address,
        discriminator: &Discriminator,
    ) -> GatewayResult<Vec<AccountSnapshot>> {
        let params = json!([
            program_id.to_string(),
            {
                "encoding": "base64",
                "commitment": self.commitment.as_str(),
                "filters": [{
                    "memcmp": {
                        "offset": 0,
                        "bytes": bs58::encode(discriminator).into_string(),
                        "encoding": "base58"
                    }
                }]
            }
        ]);
        let accounts: Vec<RpcKeyedAccount> = self.call("getProgramAccounts", params).await?;
        accounts
            .into_iter()
            .map(|keyed| {
                let address = parse_address(&keyed.pubkey)?;
                to_snapshot(address, keyed.account)
            })
            .collect()
    }

    pub async fn get_token_account_balance(
        &self,
        token_account: &Address,
    ) -> GatewayResult<TokenAmount> {
        let params = json!([token_account.to_string(), self.read_config()]);
        let response: WithContext<RpcTokenAmount> =
            self.call("getTokenAccountBalance", params).await?;
        response
            .value
            .amount
            .parse()
            .map_err(|e| GatewayError::Parse(format!("token amount: {}", e)))
    }

    pub async fn get_latest_blockhash(&self) -> GatewayResult<Hash> {
        let response: WithContext<RpcBlockhash> = self
            .call("getLatestBlockhash", json!([self.read_config()]))
            .await?;
        Hash::from_str(&response.value.blockhash)
            .map_err(|e| GatewayError::Parse(format!("blockhash: {}", e)))
    }

    pub async fn send_transaction(&self, wire: &[u8]) -> GatewayResult<TxSignature> {
        let params = json!([
            STANDARD.encode(wire),
            {
                "encoding": "base64",
                "preflightCommitment": self.commitment.as_str(),
                "skipPreflight": false
            }
        ]);
        self.call("sendTransaction", params).await
    }

    pub async fn get_signature_status(
        &self,
        signature: &str,
    ) -> GatewayResult<Option<SignatureStatus>> {
        let response: WithContext<Vec<Option<SignatureStatus>>> = self
            .call("getSignatureStatuses", json!([[signature]]))
            .await?;
        Ok(response.value.into_iter().next().flatten())
    }
}

fn map_rpc_error(error: JsonRpcError) -> GatewayError {
    if error.code == RPC_PREFLIGHT_FAILURE {
        // Simulation failures carry the program logs, which hold the reason.
        let logs = error
            .data
            .as_ref()
            .and_then(|d| d.get("logs"))
            .and_then(Value::as_array)
            .map(|logs| {
                logs.iter()
                    .filter_map(Value::as_str)
                    .filter(|line| line.contains("Error"))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default();
        let message = if logs.is_empty() {
            error.message
        } else {
            format!("{} ({})", error.message, logs)
        };
        return GatewayError::TransactionRejected(message);
    }
    GatewayError::Rpc {
        code: error.code,
        message: error.message,
    }
}

fn parse_address(text: &str) -> GatewayResult<Address> {
    text.parse()
        .map_err(|e| GatewayError::Parse(format!("address {}: {}", text, e)))
}

fn to_snapshot(address: Address, account: RpcAccount) -> GatewayResult<AccountSnapshot> {
    let data = STANDARD
        .decode(account.data.0.as_bytes())
        .map_err(|e| GatewayError::Parse(format!("account data: {}", e)))?;
    Ok(AccountSnapshot {
        address,
        owner: parse_address(&account.owner)?,
        lamports: account.lamports,
        executable: account.executable,
        data,
    })
}
