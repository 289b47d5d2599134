//! Chain client abstraction for answering "does this address own a token".

use crate::domain::{Address, BindingError};
use async_trait::async_trait;
use std::fmt;

pub mod mock;
pub mod rpc;

pub use mock::MockChainClient;
pub use rpc::{JsonRpcChainClient, OwnershipQuery, RetryPolicy};

/// Read-only ownership lookup against one or more ERC-721 contracts.
///
/// Implementations must be safe to share across concurrent workers and must
/// not cache answers between calls.
#[async_trait]
pub trait ChainClient: Send + Sync + fmt::Debug {
    /// Returns true if `owner` holds at least one token of any configured
    /// contract.
    ///
    /// A contract call that reverts counts as "not owned" rather than an
    /// error.
    async fn owns_token(&self, owner: &Address) -> Result<bool, ChainClientError>;
}

/// Error type for chain client operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainClientError {
    /// Network error (e.g., connection refused, timeout)
    NetworkError(String),
    /// HTTP error from the RPC provider
    HttpError { status: u16, message: String },
    /// Provider rate limit (HTTP 429 or JSON-RPC -32005)
    RateLimited,
    /// JSON-RPC error object returned by the node
    RpcError { code: i64, message: String },
    /// Malformed JSON-RPC envelope or undecodable return data
    ParseError(String),
    /// Other error
    Other(String),
}

impl ChainClientError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ChainClientError::NetworkError(_) | ChainClientError::RateLimited => true,
            ChainClientError::HttpError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether this is an execution revert reported by the node.
    pub fn is_revert(&self) -> bool {
        match self {
            ChainClientError::RpcError { code, message } => {
                *code == 3 || message.to_ascii_lowercase().contains("revert")
            }
            _ => false,
        }
    }
}

impl fmt::Display for ChainClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainClientError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            ChainClientError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            ChainClientError::RateLimited => write!(f, "Rate limited"),
            ChainClientError::RpcError { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            }
            ChainClientError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ChainClientError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for ChainClientError {}

impl From<BindingError> for ChainClientError {
    fn from(err: BindingError) -> Self {
        ChainClientError::ParseError(err.to_string())
    }
}
