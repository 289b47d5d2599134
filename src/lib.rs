pub mod app;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod error;
pub mod input;
pub mod orchestration;
pub mod output;

pub use config::Config;
pub use datasource::{ChainClient, ChainClientError, JsonRpcChainClient, MockChainClient};
pub use domain::{Address, ContractBinding, OwnershipResult, TokenId};
pub use error::AppError;
pub use orchestration::{OwnershipChecker, RunSummary};
