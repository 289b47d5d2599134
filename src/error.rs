use crate::config::ConfigError;
use crate::datasource::ChainClientError;
use crate::domain::BindingError;
use crate::input::InputError;
use crate::orchestration::CheckerError;
use crate::output::OutputError;
use thiserror::Error;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Input error: {0}")]
    Input(#[from] InputError),
    #[error("ABI error: {0}")]
    Binding(#[from] BindingError),
    #[error("No valid NFT contract addresses configured")]
    NoContracts,
    #[error("RPC endpoint error: {0}")]
    Rpc(#[from] ChainClientError),
    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

impl From<CheckerError> for AppError {
    fn from(err: CheckerError) -> Self {
        match err {
            CheckerError::Output(e) => AppError::Output(e),
        }
    }
}
