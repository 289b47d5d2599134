use crate::datasource::ChainClient;
use crate::domain::{Address, OwnershipResult};
use crate::orchestration::progress::ProgressTracker;
use crate::output::{OutputError, ResultSink};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// Order in which results reach the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputOrder {
    /// As each check completes.
    Arrival,
    /// Same order as the input entries.
    Input,
}

#[derive(Debug, Clone)]
pub struct CheckerOptions {
    pub workers: usize,
    pub order: OutputOrder,
    pub progress_every: usize,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            workers: 10,
            order: OutputOrder::Arrival,
            progress_every: 25,
        }
    }
}

/// Fans ownership checks out over a bounded number of concurrent workers and
/// feeds every result to a single sink.
#[derive(Debug, Clone)]
pub struct OwnershipChecker {
    client: Arc<dyn ChainClient>,
    options: CheckerOptions,
}

impl OwnershipChecker {
    pub fn new(client: Arc<dyn ChainClient>, options: CheckerOptions) -> Self {
        Self { client, options }
    }

    /// Check every entry, writing exactly one result per entry to `sink`.
    ///
    /// Per-entry failures are recorded in the result and do not stop the run.
    /// A sink error is fatal: dispatching stops and in-flight checks are
    /// dropped.
    pub async fn run<S: ResultSink>(
        &self,
        entries: Vec<String>,
        sink: &mut S,
    ) -> Result<RunSummary, CheckerError> {
        let started = Instant::now();
        let total = entries.len();
        let workers = self.options.workers.max(1);
        let mut progress = ProgressTracker::new(total, workers, self.options.progress_every);
        let mut reorder = ReorderBuffer::new(self.options.order);
        let mut summary = RunSummary {
            total,
            ..Default::default()
        };

        info!("Checking {} addresses with {} workers", total, workers);

        let mut results = stream::iter(entries.into_iter().enumerate())
            .map(|(index, entry)| {
                let client = Arc::clone(&self.client);
                async move {
                    let call_started = Instant::now();
                    let result = check_entry(client.as_ref(), &entry).await;
                    (index, result, call_started.elapsed())
                }
            })
            .buffer_unordered(workers);

        while let Some((index, result, latency)) = results.next().await {
            let snapshot = progress.record(latency);
            if progress.should_report() {
                info!("{}", snapshot);
            }
            summary.record(&result);

            for ready in reorder.push(index, result) {
                sink.write(&ready)?;
            }
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }
}

/// Validate one input entry and query the chain for it.
pub async fn check_entry(client: &dyn ChainClient, entry: &str) -> OwnershipResult {
    let address = match Address::parse(entry) {
        Ok(address) => address,
        Err(e) => {
            warn!("Invalid Ethereum address {}: {}", entry, e);
            return OwnershipResult::failed(entry, e);
        }
    };

    match client.owns_token(&address).await {
        Ok(true) => {
            info!("{}: owns NFT", entry);
            OwnershipResult::owned(entry, true)
        }
        Ok(false) => {
            info!("{}: does not own NFT", entry);
            OwnershipResult::owned(entry, false)
        }
        Err(e) => {
            warn!("Error checking {}: {}", entry, e);
            OwnershipResult::failed(entry, e)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub owners: usize,
    pub non_owners: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    fn record(&mut self, result: &OwnershipResult) {
        if result.is_error() {
            self.failed += 1;
        } else if result.owns_token {
            self.owners += 1;
        } else {
            self.non_owners += 1;
        }
    }

    pub fn processed(&self) -> usize {
        self.owners + self.non_owners + self.failed
    }
}

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Releases results either immediately or in input order.
#[derive(Debug)]
struct ReorderBuffer {
    order: OutputOrder,
    next: usize,
    pending: BTreeMap<usize, OwnershipResult>,
}

impl ReorderBuffer {
    fn new(order: OutputOrder) -> Self {
        Self {
            order,
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    fn push(&mut self, index: usize, result: OwnershipResult) -> Vec<OwnershipResult> {
        if self.order == OutputOrder::Arrival {
            return vec![result];
        }

        self.pending.insert(index, result);
        let mut ready = Vec::new();
        while let Some(result) = self.pending.remove(&self.next) {
            ready.push(result);
            self.next += 1;
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{ChainClientError, MockChainClient};

    const OWNER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const NON_OWNER: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

    #[tokio::test]
    async fn test_check_entry_owner_and_non_owner() {
        let client = MockChainClient::new().with_owner(Address::parse(OWNER).unwrap());
        assert_eq!(
            check_entry(&client, OWNER).await,
            OwnershipResult::owned(OWNER, true)
        );
        assert_eq!(
            check_entry(&client, NON_OWNER).await,
            OwnershipResult::owned(NON_OWNER, false)
        );
    }

    #[tokio::test]
    async fn test_check_entry_invalid_address_skips_client() {
        let client = MockChainClient::new();
        let result = check_entry(&client, "not-an-address").await;
        assert!(result.is_error());
        assert!(!result.owns_token);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_check_entry_records_client_error() {
        let client = MockChainClient::new().failing_all(ChainClientError::RateLimited);
        let result = check_entry(&client, OWNER).await;
        assert_eq!(result.error.as_deref(), Some("Rate limited"));
    }

    #[test]
    fn test_reorder_buffer_arrival_passes_through() {
        let mut buf = ReorderBuffer::new(OutputOrder::Arrival);
        let out = buf.push(3, OwnershipResult::owned("d", false));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_reorder_buffer_input_releases_contiguous_prefix() {
        let mut buf = ReorderBuffer::new(OutputOrder::Input);
        assert!(buf.push(2, OwnershipResult::owned("c", false)).is_empty());
        assert!(buf.push(1, OwnershipResult::owned("b", false)).is_empty());

        let out = buf.push(0, OwnershipResult::owned("a", false));
        let addrs: Vec<_> = out.iter().map(|r| r.address.as_str()).collect();
        assert_eq!(addrs, vec!["a", "b", "c"]);

        let out = buf.push(3, OwnershipResult::owned("d", false));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_run_summary_counts() {
        let mut summary = RunSummary::default();
        summary.record(&OwnershipResult::owned("a", true));
        summary.record(&OwnershipResult::owned("b", false));
        summary.record(&OwnershipResult::failed("c", "boom"));
        assert_eq!((summary.owners, summary.non_owners, summary.failed), (1, 1, 1));
        assert_eq!(summary.processed(), 3);
    }
}
