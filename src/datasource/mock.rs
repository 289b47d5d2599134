//! Mock chain client for testing without network calls.

use super::{ChainClient, ChainClientError};
use crate::domain::Address;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock chain client that answers from a predefined owner set.
#[derive(Debug, Default)]
pub struct MockChainClient {
    owners: HashSet<Address>,
    failures: HashMap<Address, ChainClientError>,
    fail_all: Option<ChainClientError>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl MockChainClient {
    /// Create a new mock where nobody owns anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an address as owning a token.
    pub fn with_owner(mut self, owner: Address) -> Self {
        self.owners.insert(owner);
        self
    }

    /// Mark several addresses as owning a token.
    pub fn with_owners(mut self, owners: impl IntoIterator<Item = Address>) -> Self {
        self.owners.extend(owners);
        self
    }

    /// Make lookups for `address` fail with `error`.
    pub fn with_failure(mut self, address: Address, error: ChainClientError) -> Self {
        self.failures.insert(address, error);
        self
    }

    /// Make every lookup fail, as with an unreachable endpoint.
    pub fn failing_all(mut self, error: ChainClientError) -> Self {
        self.fail_all = Some(error);
        self
    }

    /// Delay each lookup, to exercise concurrent scheduling.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of lookups performed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn owns_token(&self, owner: &Address) -> Result<bool, ChainClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = &self.fail_all {
            return Err(err.clone());
        }
        if let Some(err) = self.failures.get(owner) {
            return Err(err.clone());
        }

        Ok(self.owners.contains(owner))
    }
}
