//! JSON-RPC chain client using `eth_call`.

use super::{ChainClient, ChainClientError};
use crate::domain::{Address, ContractBinding, TokenId};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// JSON-RPC error code some providers use for request rate limiting.
const RATE_LIMIT_CODE: i64 = -32005;

/// How ownership is determined for each contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipQuery {
    /// `balanceOf(owner) > 0`
    BalanceOf,
    /// `ownerOf(id) == owner` for any of the listed token ids
    OwnerOf(Vec<TokenId>),
}

/// Bounded retry for transient transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; later retries back off exponentially.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Outcome of a single `eth_call`.
#[derive(Debug)]
enum CallOutcome {
    Returned(Vec<u8>),
    Reverted(String),
}

/// Chain client talking to an Ethereum JSON-RPC endpoint over HTTP.
#[derive(Debug)]
pub struct JsonRpcChainClient {
    client: Client,
    rpc_url: String,
    contracts: Vec<ContractBinding>,
    query: OwnershipQuery,
    retry: RetryPolicy,
    next_id: AtomicU64,
}

impl JsonRpcChainClient {
    /// Create a client for `rpc_url` querying `contracts` in order.
    ///
    /// `timeout` bounds each HTTP request, including connection setup.
    pub fn new(
        rpc_url: String,
        contracts: Vec<ContractBinding>,
        query: OwnershipQuery,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, ChainClientError> {
        reqwest::Url::parse(&rpc_url)
            .map_err(|e| ChainClientError::Other(format!("invalid RPC URL {}: {}", rpc_url, e)))?;

        if contracts.is_empty() {
            return Err(ChainClientError::Other(
                "no contracts configured".to_string(),
            ));
        }
        if let OwnershipQuery::OwnerOf(_) = query {
            if let Some(c) = contracts.iter().find(|c| !c.supports_owner_of()) {
                return Err(ChainClientError::Other(format!(
                    "contract {} has no ownerOf(uint256) in its ABI",
                    c.address()
                )));
            }
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            rpc_url,
            contracts,
            query,
            retry,
            next_id: AtomicU64::new(1),
        })
    }

    /// Query `eth_chainId`; used as a reachability probe at startup.
    pub async fn chain_id(&self) -> Result<u64, ChainClientError> {
        let value = self.post_rpc("eth_chainId", serde_json::json!([])).await?;
        let hex_str = value
            .as_str()
            .ok_or_else(|| ChainClientError::ParseError("Expected string chain id".to_string()))?;
        u64::from_str_radix(hex_str.trim_start_matches("0x"), 16)
            .map_err(|e| ChainClientError::ParseError(format!("Invalid chain id: {}", e)))
    }

    async fn post_rpc(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainClientError> {
        let attempts = AtomicU32::new(0);
        let backoff = ExponentialBackoff {
            current_interval: self.retry.initial_delay,
            initial_interval: self.retry.initial_delay,
            max_interval: self.retry.initial_delay * 8,
            max_elapsed_time: None,
            ..Default::default()
        };

        retry(backoff, || async {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            let payload = serde_json::json!({
                "jsonrpc": "2.0",
                "id": self.next_id.fetch_add(1, Ordering::Relaxed),
                "method": method,
                "params": params.clone(),
            });

            match self.send_once(&payload).await {
                Ok(value) => Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    warn!("[Attempt {}] {} failed: {}", attempt, method, e);
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }

    async fn send_once(
        &self,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, ChainClientError> {
        let response = self
            .client
            .post(&self.rpc_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ChainClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == 429 {
            return Err(ChainClientError::RateLimited);
        }
        if status.is_server_error() {
            return Err(ChainClientError::HttpError {
                status: status.as_u16(),
                message: "Server error".to_string(),
            });
        }
        if !status.is_success() {
            return Err(ChainClientError::HttpError {
                status: status.as_u16(),
                message: "Client error".to_string(),
            });
        }

        let body = response
            .json::<JsonRpcResponse>()
            .await
            .map_err(|e| ChainClientError::ParseError(e.to_string()))?;

        if let Some(err) = body.error {
            if err.code == RATE_LIMIT_CODE {
                return Err(ChainClientError::RateLimited);
            }
            return Err(ChainClientError::RpcError {
                code: err.code,
                message: err.message,
            });
        }

        body.result
            .ok_or_else(|| ChainClientError::ParseError("Missing result field".to_string()))
    }

    async fn eth_call(
        &self,
        contract: &ContractBinding,
        data: &[u8],
    ) -> Result<CallOutcome, ChainClientError> {
        let params = serde_json::json!([
            {
                "to": contract.address().to_checksum(),
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest"
        ]);

        match self.post_rpc("eth_call", params).await {
            Ok(value) => {
                let hex_str = value.as_str().ok_or_else(|| {
                    ChainClientError::ParseError("Expected hex string result".to_string())
                })?;
                let bytes = hex::decode(hex_str.trim_start_matches("0x"))
                    .map_err(|e| ChainClientError::ParseError(format!("Invalid hex: {}", e)))?;
                Ok(CallOutcome::Returned(bytes))
            }
            Err(e) if e.is_revert() => Ok(CallOutcome::Reverted(e.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Current owner of `token_id`, or `None` when the call reverts
    /// (burned or never minted).
    async fn owner_of(
        &self,
        contract: &ContractBinding,
        token_id: &TokenId,
    ) -> Result<Option<Address>, ChainClientError> {
        let data = contract.encode_owner_of(token_id)?;
        match self.eth_call(contract, &data).await? {
            CallOutcome::Returned(bytes) => Ok(Some(contract.decode_owner_of(&bytes)?)),
            CallOutcome::Reverted(reason) => {
                debug!(
                    "ownerOf({}) reverted on {}: {}",
                    token_id,
                    contract.address(),
                    reason
                );
                Ok(None)
            }
        }
    }

    async fn owns_in_contract(
        &self,
        contract: &ContractBinding,
        owner: &Address,
    ) -> Result<bool, ChainClientError> {
        match &self.query {
            OwnershipQuery::BalanceOf => {
                let data = contract.encode_balance_of(owner)?;
                match self.eth_call(contract, &data).await? {
                    CallOutcome::Returned(bytes) => {
                        let balance = contract.decode_balance_of(&bytes)?;
                        Ok(!balance.is_zero())
                    }
                    CallOutcome::Reverted(reason) => {
                        debug!(
                            "balanceOf reverted for {} on {}: {}",
                            owner,
                            contract.address(),
                            reason
                        );
                        Ok(false)
                    }
                }
            }
            OwnershipQuery::OwnerOf(token_ids) => {
                let mut last_error = None;

                for token_id in token_ids {
                    match self.owner_of(contract, token_id).await {
                        Ok(Some(token_owner)) if token_owner == *owner => return Ok(true),
                        Ok(_) => {}
                        Err(e) => {
                            warn!(
                                "Error querying ownerOf({}) on {}: {}",
                                token_id,
                                contract.address(),
                                e
                            );
                            last_error = Some(e);
                        }
                    }
                }

                match last_error {
                    Some(e) => Err(e),
                    None => Ok(false),
                }
            }
        }
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn owns_token(&self, owner: &Address) -> Result<bool, ChainClientError> {
        let mut last_error = None;

        for contract in &self.contracts {
            match self.owns_in_contract(contract, owner).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    warn!("Error checking {} on {}: {}", owner, contract.address(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(false),
        }
    }
}
