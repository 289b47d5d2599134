//! Domain types for NFT ownership checks.
//!
//! This module provides:
//! - Address parsing with EIP-55 checksum validation
//! - ERC-721 contract bindings built from an ABI file
//! - The per-address ownership result written to the output

pub mod binding;
pub mod ownership;
pub mod primitives;

pub use binding::{load_abi, parse_abi, BindingError, ContractBinding};
pub use ownership::OwnershipResult;
pub use primitives::{Address, AddressParseError, TokenId};
