use crate::error::{ApiError, Result};
use alloy::primitives::Address;
use std::str::FromStr;

/// Parses a 0x-prefixed 20 byte hex address and returns it lowercased, the
/// form every table keys wallets by.
pub fn normalize_address(address: &str) -> Result<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ApiError::BadRequest("Wallet address is required".to_owned()));
    }
    parse_address(address)?;
    Ok(address.to_lowercase())
}

pub fn parse_address(address: &str) -> Result<Address> {
    let address = address.trim();
    if !address.starts_with("0x") {
        return Err(ApiError::BadRequest("Invalid wallet address".to_owned()));
    }
    // checksum casing is not enforced
    Address::from_str(address)
        .map_err(|_| ApiError::BadRequest("Invalid wallet address".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_checksummed_address() {
        let address = normalize_address("0x23924869fF64AB205b3e3Be388A373d75De74EbD").unwrap();
        assert_eq!(address, "0x23924869ff64ab205b3e3be388a373d75de74ebd");
    }

    #[test]
    fn rejects_empty_and_malformed() {
        assert!(matches!(
            normalize_address("  "),
            Err(ApiError::BadRequest(message)) if message == "Wallet address is required"
        ));
        assert!(matches!(
            normalize_address("0x1234"),
            Err(ApiError::BadRequest(message)) if message == "Invalid wallet address"
        ));
        assert!(normalize_address("not-a-wallet").is_err());
        assert!(normalize_address("23924869ff64ab205b3e3be388a373d75de74ebd").is_err());
    }
}
