//! Wiring a configured run: inputs, contract bindings, RPC client, output.

use crate::config::{Config, ContractsSource};
use crate::datasource::{ChainClient, JsonRpcChainClient, OwnershipQuery, RetryPolicy};
use crate::domain::{load_abi, Address, ContractBinding};
use crate::error::AppError;
use crate::input::{dedup, AddressSource};
use crate::orchestration::{CheckerOptions, OwnershipChecker, RunSummary};
use crate::output::ResultWriter;
use std::sync::Arc;
use tracing::{info, warn};

/// Read the address list, deduplicating when configured.
pub fn load_addresses(config: &Config) -> Result<Vec<String>, AppError> {
    let entries = AddressSource::new(&config.input_file).load()?;
    if entries.is_empty() {
        warn!("No addresses found in {}", config.input_file.display());
    }

    if !config.dedup_addresses {
        return Ok(entries);
    }
    let before = entries.len();
    let entries = dedup(entries);
    if entries.len() < before {
        info!("Dropped {} duplicate addresses", before - entries.len());
    }
    Ok(entries)
}

/// Bind every configured contract address to the ABI.
///
/// Malformed contract addresses are skipped with a warning; having none left
/// is fatal.
pub fn load_contracts(config: &Config) -> Result<Vec<ContractBinding>, AppError> {
    let abi = load_abi(&config.abi_file)?;
    let raw = match &config.contracts {
        ContractsSource::Inline(list) => list.clone(),
        ContractsSource::File(path) => AddressSource::new(path).load()?,
    };

    let mut bindings = Vec::new();
    for entry in raw {
        match Address::parse(&entry) {
            Ok(address) => bindings.push(ContractBinding::new(address, &abi)?),
            Err(e) => warn!("Invalid contract address skipped: {} ({})", entry, e),
        }
    }

    if bindings.is_empty() {
        return Err(AppError::NoContracts);
    }
    info!("Loaded {} NFT contracts", bindings.len());
    Ok(bindings)
}

/// Build the JSON-RPC client and, unless disabled, probe the endpoint.
pub async fn build_client(
    config: &Config,
    contracts: Vec<ContractBinding>,
) -> Result<JsonRpcChainClient, AppError> {
    let query = match &config.token_ids {
        Some(ids) => OwnershipQuery::OwnerOf(ids.clone()),
        None => OwnershipQuery::BalanceOf,
    };
    let retry = RetryPolicy {
        max_attempts: config.max_retries,
        initial_delay: config.retry_delay,
    };
    let client = JsonRpcChainClient::new(
        config.rpc_url.clone(),
        contracts,
        query,
        retry,
        config.request_timeout,
    )?;

    if config.startup_check {
        let chain_id = client.chain_id().await?;
        info!("Connected to RPC endpoint (chain id {})", chain_id);
    }

    Ok(client)
}

/// Execute a full run from configuration.
pub async fn run(config: &Config) -> Result<RunSummary, AppError> {
    let entries = load_addresses(config)?;
    let contracts = load_contracts(config)?;
    let client: Arc<dyn ChainClient> = Arc::new(build_client(config, contracts).await?);
    run_with_client(config, client, entries).await
}

/// Check `entries` with an already-built client and write the CSV output.
///
/// The output file is flushed even when the run aborts.
pub async fn run_with_client(
    config: &Config,
    client: Arc<dyn ChainClient>,
    entries: Vec<String>,
) -> Result<RunSummary, AppError> {
    let mut writer = ResultWriter::create(&config.output_file)?;
    let checker = OwnershipChecker::new(
        client,
        CheckerOptions {
            workers: config.workers,
            order: config.output_order,
            progress_every: config.progress_every,
        },
    );

    let outcome = checker.run(entries, &mut writer).await;
    let rows = writer.rows();
    let flushed = writer.finish();
    let summary = outcome?;
    flushed?;

    info!(
        "Saved {} results to {} ({} owners, {} non-owners, {} errors)",
        rows,
        config.output_file.display(),
        summary.owners,
        summary.non_owners,
        summary.failed
    );
    Ok(summary)
}
