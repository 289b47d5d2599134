use crate::domain::TokenId;
use crate::orchestration::OutputOrder;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub input_file: PathBuf,
    pub abi_file: PathBuf,
    pub output_file: PathBuf,
    pub contracts: ContractsSource,
    pub workers: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub token_ids: Option<Vec<TokenId>>,
    pub dedup_addresses: bool,
    pub output_order: OutputOrder,
    pub progress_every: usize,
    pub startup_check: bool,
}

/// Where contract addresses come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractsSource {
    /// Listed inline in `NFT_CONTRACTS`.
    Inline(Vec<String>),
    /// One per line in a file.
    File(PathBuf),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| {
            env_map
                .get(key)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        };
        let rpc_url = non_blank("RPC_URL")
            .or_else(|| non_blank("INFURA_URL"))
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingEnv("RPC_URL".to_string()))?;

        let path = |key: &str, default: &str| -> PathBuf {
            PathBuf::from(env_map.get(key).map(|s| s.as_str()).unwrap_or(default))
        };

        let contracts = match env_map.get("NFT_CONTRACTS") {
            Some(list) => {
                let list = split_list(list);
                if list.is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "NFT_CONTRACTS".to_string(),
                        "must list at least one contract address".to_string(),
                    ));
                }
                ContractsSource::Inline(list)
            }
            None => ContractsSource::File(path("CONTRACTS_FILE", "nft_contracts.txt")),
        };

        let workers = parse_or(&env_map, "NUM_WORKERS", 10usize, "must be a positive integer")?;
        if workers == 0 {
            return Err(ConfigError::InvalidValue(
                "NUM_WORKERS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let max_retries = parse_or(&env_map, "MAX_RETRIES", 3u32, "must be a positive integer")?;
        if max_retries == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_RETRIES".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let retry_delay_ms = parse_or(&env_map, "RETRY_DELAY_MS", 1500u64, "must be a valid u64")?;
        let request_timeout_ms =
            parse_or(&env_map, "REQUEST_TIMEOUT_MS", 30_000u64, "must be a valid u64")?;
        if request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "REQUEST_TIMEOUT_MS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        let token_ids = match env_map.get("TOKEN_IDS") {
            Some(raw) => Some(parse_token_ids(raw)?),
            None => None,
        };

        let dedup_addresses = parse_bool(&env_map, "DEDUP_ADDRESSES", false)?;
        let startup_check = !parse_bool(&env_map, "SKIP_STARTUP_CHECK", false)?;

        let output_order = match env_map
            .get("OUTPUT_ORDER")
            .map(|s| s.as_str())
            .unwrap_or("arrival")
        {
            "arrival" => OutputOrder::Arrival,
            "input" => OutputOrder::Input,
            other => {
                return Err(ConfigError::InvalidValue(
                    "OUTPUT_ORDER".to_string(),
                    format!("must be arrival or input, got {}", other),
                ))
            }
        };

        let progress_every =
            parse_or(&env_map, "PROGRESS_EVERY", 25usize, "must be a positive integer")?.max(1);

        Ok(Config {
            rpc_url,
            input_file: path("INPUT_FILE", "input_addresses.txt"),
            abi_file: path("ABI_FILE", "erc721_abi.json"),
            output_file: path("OUTPUT_FILE", "nft_owners.csv"),
            contracts,
            workers,
            max_retries,
            retry_delay: Duration::from_millis(retry_delay_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
            token_ids,
            dedup_addresses,
            output_order,
            progress_every,
            startup_check,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    hint: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), hint.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(
    env_map: &HashMap<String, String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match env_map.get(key).map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue(
                key.to_string(),
                format!("must be true or false, got {}", v),
            )),
        },
    }
}

fn parse_token_ids(raw: &str) -> Result<Vec<TokenId>, ConfigError> {
    let ids = split_list(raw)
        .iter()
        .map(|s| {
            TokenId::parse(s).ok_or_else(|| {
                ConfigError::InvalidValue("TOKEN_IDS".to_string(), format!("invalid token id {}", s))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if ids.is_empty() {
        return Err(ConfigError::InvalidValue(
            "TOKEN_IDS".to_string(),
            "must list at least one token id".to_string(),
        ));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(
            "RPC_URL".to_string(),
            "https://mainnet.infura.io/v3/test".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.input_file, PathBuf::from("input_addresses.txt"));
        assert_eq!(config.abi_file, PathBuf::from("erc721_abi.json"));
        assert_eq!(config.output_file, PathBuf::from("nft_owners.csv"));
        assert_eq!(
            config.contracts,
            ContractsSource::File(PathBuf::from("nft_contracts.txt"))
        );
        assert_eq!(config.workers, 10);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(1500));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.token_ids.is_none());
        assert!(!config.dedup_addresses);
        assert_eq!(config.output_order, OutputOrder::Arrival);
        assert!(config.startup_check);
    }

    #[test]
    fn test_missing_rpc_url() {
        let result = Config::from_env_map(HashMap::new());
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "RPC_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_infura_url_fallback() {
        let mut env_map = HashMap::new();
        env_map.insert("INFURA_URL".to_string(), "https://infura.example".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.rpc_url, "https://infura.example");
    }

    #[test]
    fn test_blank_rpc_url_falls_back_to_infura_url() {
        let mut env_map = HashMap::new();
        env_map.insert("RPC_URL".to_string(), "  ".to_string());
        env_map.insert("INFURA_URL".to_string(), "https://infura.example".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.rpc_url, "https://infura.example");

        let mut env_map = HashMap::new();
        env_map.insert("RPC_URL".to_string(), String::new());
        env_map.insert("INFURA_URL".to_string(), String::new());
        assert!(matches!(
            Config::from_env_map(env_map),
            Err(ConfigError::MissingEnv(_))
        ));
    }

    #[test]
    fn test_inline_contracts() {
        let mut env_map = setup_required_env();
        env_map.insert("NFT_CONTRACTS".to_string(), " 0xA , ,0xB".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(
            config.contracts,
            ContractsSource::Inline(vec!["0xA".to_string(), "0xB".to_string()])
        );
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("NUM_WORKERS".to_string(), "0".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "NUM_WORKERS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_workers() {
        let mut env_map = setup_required_env();
        env_map.insert("NUM_WORKERS".to_string(), "many".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "NUM_WORKERS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_output_order() {
        let mut env_map = setup_required_env();
        env_map.insert("OUTPUT_ORDER".to_string(), "random".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "OUTPUT_ORDER"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_token_ids() {
        let mut env_map = setup_required_env();
        env_map.insert("TOKEN_IDS".to_string(), "1, 0x10".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(
            config.token_ids,
            Some(vec![TokenId::parse("1").unwrap(), TokenId::parse("16").unwrap()])
        );
    }

    #[test]
    fn test_invalid_token_id() {
        let mut env_map = setup_required_env();
        env_map.insert("TOKEN_IDS".to_string(), "1,abc".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "TOKEN_IDS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_bool_flags() {
        let mut env_map = setup_required_env();
        env_map.insert("DEDUP_ADDRESSES".to_string(), "TRUE".to_string());
        env_map.insert("SKIP_STARTUP_CHECK".to_string(), "1".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert!(config.dedup_addresses);
        assert!(!config.startup_check);

        let mut env_map = setup_required_env();
        env_map.insert("DEDUP_ADDRESSES".to_string(), "maybe".to_string());
        assert!(Config::from_env_map(env_map).is_err());
    }
}
