//! ERC-721 contract binding: contract address plus the ABI functions used to
//! build and decode ownership calls.

use super::primitives::{Address, TokenId};
use ethabi::{Contract, Function, ParamType, Token};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("ABI file not found: {0}")]
    AbiNotFound(String),
    #[error("invalid ABI: {0}")]
    InvalidAbi(String),
    #[error("ABI does not declare a usable {0}")]
    MissingFunction(&'static str),
    #[error("failed to encode call: {0}")]
    Encode(String),
    #[error("failed to decode return data: {0}")]
    Decode(String),
}

/// Loads an ABI JSON array from disk.
pub fn load_abi(path: &Path) -> Result<Contract, BindingError> {
    let file = File::open(path)
        .map_err(|_| BindingError::AbiNotFound(path.display().to_string()))?;
    parse_abi(file)
}

/// Parses an ABI JSON array from any reader.
pub fn parse_abi<R: Read>(reader: R) -> Result<Contract, BindingError> {
    Contract::load(reader).map_err(|e| BindingError::InvalidAbi(e.to_string()))
}

/// A deployed ERC-721 contract and the functions needed to query it.
///
/// Built once at startup and shared read-only across all workers.
#[derive(Debug, Clone)]
pub struct ContractBinding {
    address: Address,
    balance_of: Function,
    owner_of: Option<Function>,
}

impl ContractBinding {
    /// Bind `address` to the `balanceOf(address)` (and, if present,
    /// `ownerOf(uint256)`) entries of `abi`.
    pub fn new(address: Address, abi: &Contract) -> Result<Self, BindingError> {
        let balance_of = abi
            .function("balanceOf")
            .ok()
            .filter(|f| {
                has_signature(f, &[ParamType::Address], &ParamType::Uint(256))
            })
            .cloned()
            .ok_or(BindingError::MissingFunction("balanceOf(address) -> uint256"))?;

        let owner_of = abi
            .function("ownerOf")
            .ok()
            .filter(|f| has_signature(f, &[ParamType::Uint(256)], &ParamType::Address))
            .cloned();

        Ok(Self {
            address,
            balance_of,
            owner_of,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn supports_owner_of(&self) -> bool {
        self.owner_of.is_some()
    }

    /// Calldata for `balanceOf(owner)`.
    pub fn encode_balance_of(&self, owner: &Address) -> Result<Vec<u8>, BindingError> {
        self.balance_of
            .encode_input(&[Token::Address((*owner).into())])
            .map_err(|e| BindingError::Encode(e.to_string()))
    }

    /// Decode the `balanceOf` return value.
    pub fn decode_balance_of(&self, data: &[u8]) -> Result<ethabi::Uint, BindingError> {
        let tokens = self
            .balance_of
            .decode_output(data)
            .map_err(|e| BindingError::Decode(e.to_string()))?;
        match tokens.as_slice() {
            [Token::Uint(balance)] => Ok(*balance),
            other => Err(BindingError::Decode(format!(
                "unexpected balanceOf output: {:?}",
                other
            ))),
        }
    }

    /// Calldata for `ownerOf(token_id)`.
    pub fn encode_owner_of(&self, token_id: &TokenId) -> Result<Vec<u8>, BindingError> {
        let function = self
            .owner_of
            .as_ref()
            .ok_or(BindingError::MissingFunction("ownerOf(uint256) -> address"))?;
        function
            .encode_input(&[Token::Uint(token_id.0)])
            .map_err(|e| BindingError::Encode(e.to_string()))
    }

    /// Decode the `ownerOf` return value.
    pub fn decode_owner_of(&self, data: &[u8]) -> Result<Address, BindingError> {
        let function = self
            .owner_of
            .as_ref()
            .ok_or(BindingError::MissingFunction("ownerOf(uint256) -> address"))?;
        let tokens = function
            .decode_output(data)
            .map_err(|e| BindingError::Decode(e.to_string()))?;
        match tokens.as_slice() {
            [Token::Address(owner)] => Ok(Address::from(*owner)),
            other => Err(BindingError::Decode(format!(
                "unexpected ownerOf output: {:?}",
                other
            ))),
        }
    }
}

fn has_signature(function: &Function, inputs: &[ParamType], output: &ParamType) -> bool {
    function.inputs.len() == inputs.len()
        && function
            .inputs
            .iter()
            .zip(inputs)
            .all(|(param, kind)| &param.kind == kind)
        && function.outputs.len() == 1
        && &function.outputs[0].kind == output
}
