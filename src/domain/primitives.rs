//! Domain primitives: Address, TokenId.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when an input line is not a usable Ethereum address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("invalid address length: expected 40 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),
    #[error("address checksum mismatch: {0}")]
    BadChecksum(String),
}

/// 20-byte Ethereum account address.
///
/// Parsing accepts an optional `0x` prefix and either single-case hex or a
/// mixed-case EIP-55 checksummed form. Mixed-case input with a wrong checksum
/// is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(alloy_primitives::Address);

impl Address {
    /// Create an Address from raw bytes.
    pub fn new(bytes: [u8; 20]) -> Self {
        Address(alloy_primitives::Address::new(bytes))
    }

    /// Parse an address string, validating the checksum when mixed-case.
    pub fn parse(input: &str) -> Result<Self, AddressParseError> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != 40 {
            return Err(AddressParseError::InvalidLength(digits.len()));
        }

        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper {
            return alloy_primitives::Address::parse_checksummed(format!("0x{}", digits), None)
                .map(Address)
                .map_err(|e| match e {
                    alloy_primitives::AddressError::InvalidChecksum => {
                        AddressParseError::BadChecksum(trimmed.to_string())
                    }
                    _ => AddressParseError::InvalidHex(trimmed.to_string()),
                });
        }

        digits
            .parse::<alloy_primitives::Address>()
            .map(Address)
            .map_err(|_| AddressParseError::InvalidHex(trimmed.to_string()))
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0 .0 .0
    }

    /// EIP-55 checksummed representation with `0x` prefix.
    pub fn to_checksum(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl From<Address> for ethabi::Address {
    fn from(addr: Address) -> Self {
        ethabi::Address::from(*addr.as_bytes())
    }
}

impl From<ethabi::Address> for Address {
    fn from(addr: ethabi::Address) -> Self {
        Address::new(addr.0)
    }
}

/// ERC-721 token identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub ethabi::Uint);

impl TokenId {
    /// Parse a decimal or `0x`-prefixed hex token id.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        let value = match s.strip_prefix("0x") {
            Some(hex_digits) => ethabi::Uint::from_str_radix(hex_digits, 16).ok()?,
            None => ethabi::Uint::from_dec_str(s).ok()?,
        };
        Some(TokenId(value))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference vectors from EIP-55.
    const CHECKSUMMED: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_checksum_matches_eip55_vectors() {
        for expected in CHECKSUMMED {
            let addr = Address::parse(&expected.to_lowercase()).unwrap();
            assert_eq!(addr.to_checksum(), expected);
        }
    }

    #[test]
    fn test_parse_accepts_checksummed_and_single_case() {
        for s in CHECKSUMMED {
            assert!(Address::parse(s).is_ok());
            assert!(Address::parse(&s.to_lowercase()).is_ok());
            assert!(Address::parse(&s[2..].to_uppercase()).is_ok());
        }
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        let broken = "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert!(matches!(
            Address::parse(broken),
            Err(AddressParseError::BadChecksum(_))
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(matches!(
            Address::parse("not-an-address"),
            Err(AddressParseError::InvalidLength(_))
        ));
        assert!(matches!(
            Address::parse("0xzz00000000000000000000000000000000000000"),
            Err(AddressParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let addr = Address::parse("  0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed \n").unwrap();
        assert_eq!(addr.to_string(), CHECKSUMMED[0]);
    }

    #[test]
    fn test_token_id_parse() {
        assert_eq!(TokenId::parse("42"), Some(TokenId(ethabi::Uint::from(42u64))));
        assert_eq!(TokenId::parse("0x2a"), Some(TokenId(ethabi::Uint::from(42u64))));
        assert_eq!(TokenId::parse("forty-two"), None);
    }
}
