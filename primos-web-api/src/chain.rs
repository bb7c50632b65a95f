use crate::error::{ApiError, Result};
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

sol! {
    #[sol(rpc)]
    interface IPrimos {
        function balanceOf(address owner) external view returns (uint256);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
        function tokenURI(uint256 tokenId) external view returns (string);
    }

    #[sol(rpc)]
    interface IEvoStones {
        function balanceOf(address account, uint256 id) external view returns (uint256);
        function uri(uint256 id) external view returns (string);
    }
}

/// Read-only view of the Primos and EvoZtone contracts.
#[async_trait]
pub trait NftChain: Send + Sync {
    /// Primos token ids held by `owner`, in enumeration order.
    async fn primo_token_ids(&self, owner: Address) -> Result<Vec<U256>>;

    async fn primo_token_uri(&self, token_id: U256) -> Result<String>;

    async fn stone_balance(&self, owner: Address, stone_id: U256) -> Result<U256>;

    async fn stone_uri(&self, stone_id: U256) -> Result<String>;
}

/// Chain handle kept in Rocket state.
pub type SharedChain = Arc<dyn NftChain>;

pub struct RoninChain {
    provider: DynProvider,
    primos: Address,
    stones: Address,
}

impl RoninChain {
    pub fn new(rpc_url: &str, primos: &str, stones: &str) -> Result<Self> {
        let rpc_url: Url = rpc_url
            .parse()
            .map_err(|e| ApiError::Chain(format!("Invalid RPC URL: {}", e)))?;
        let primos = crate::wallet::parse_address(primos)
            .map_err(|_| ApiError::Chain(format!("Invalid Primos contract: {}", primos)))?;
        let stones = crate::wallet::parse_address(stones)
            .map_err(|_| ApiError::Chain(format!("Invalid stones contract: {}", stones)))?;

        info!("Ronin provider: {}", rpc_url);
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
        Ok(Self {
            provider,
            primos,
            stones,
        })
    }
}

fn chain_error(error: alloy::contract::Error) -> ApiError {
    ApiError::Chain(error.to_string())
}

#[async_trait]
impl NftChain for RoninChain {
    async fn primo_token_ids(&self, owner: Address) -> Result<Vec<U256>> {
        let contract = IPrimos::new(self.primos, self.provider.clone());
        let balance = contract.balanceOf(owner).call().await.map_err(chain_error)?;
        let balance: u64 = balance
            .try_into()
            .map_err(|_| ApiError::Chain(format!("Balance out of range: {}", balance)))?;

        let mut token_ids = Vec::with_capacity(balance as usize);
        for index in 0..balance {
            let token_id = contract
                .tokenOfOwnerByIndex(owner, U256::from(index))
                .call()
                .await
                .map_err(chain_error)?;
            token_ids.push(token_id);
        }
        Ok(token_ids)
    }

    async fn primo_token_uri(&self, token_id: U256) -> Result<String> {
        IPrimos::new(self.primos, self.provider.clone())
            .tokenURI(token_id)
            .call()
            .await
            .map_err(chain_error)
    }

    async fn stone_balance(&self, owner: Address, stone_id: U256) -> Result<U256> {
        IEvoStones::new(self.stones, self.provider.clone())
            .balanceOf(owner, stone_id)
            .call()
            .await
            .map_err(chain_error)
    }

    async fn stone_uri(&self, stone_id: U256) -> Result<String> {
        IEvoStones::new(self.stones, self.provider.clone())
            .uri(stone_id)
            .call()
            .await
            .map_err(chain_error)
    }
}

/// Expands the ERC-1155 `{id}` placeholder: lowercase hex, zero padded to 64 chars.
pub fn expand_erc1155_uri(uri: &str, id: U256) -> String {
    uri.replace("{id}", &format!("{:064x}", id))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory chain for service tests.
    #[derive(Default)]
    pub(crate) struct FakeChain {
        pub primos: HashMap<Address, Vec<u64>>,
        pub token_uris: HashMap<u64, String>,
        pub stones: HashMap<(Address, u64), u64>,
        pub stone_uris: HashMap<u64, String>,
        pub fail: bool,
    }

    #[async_trait]
    impl NftChain for FakeChain {
        async fn primo_token_ids(&self, owner: Address) -> Result<Vec<U256>> {
            if self.fail {
                return Err(ApiError::Chain("connection refused".to_owned()));
            }
            Ok(self
                .primos
                .get(&owner)
                .map(|ids| ids.iter().map(|id| U256::from(*id)).collect())
                .unwrap_or_default())
        }

        async fn primo_token_uri(&self, token_id: U256) -> Result<String> {
            let token_id: u64 = token_id.to();
            Ok(self.token_uris.get(&token_id).cloned().unwrap_or_default())
        }

        async fn stone_balance(&self, owner: Address, stone_id: U256) -> Result<U256> {
            if self.fail {
                return Err(ApiError::Chain("connection refused".to_owned()));
            }
            let stone_id: u64 = stone_id.to();
            Ok(U256::from(
                self.stones.get(&(owner, stone_id)).copied().unwrap_or(0),
            ))
        }

        async fn stone_uri(&self, stone_id: U256) -> Result<String> {
            let stone_id: u64 = stone_id.to();
            Ok(self.stone_uris.get(&stone_id).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn erc1155_id_placeholder() {
        assert_eq!(
            expand_erc1155_uri("ipfs://Qm/{id}.json", U256::from(3)),
            format!("ipfs://Qm/{}3.json", "0".repeat(63))
        );
        assert_eq!(
            expand_erc1155_uri("https://x/1.json", U256::from(1)),
            "https://x/1.json"
        );
    }

    #[test]
    fn rejects_bad_contract_address() {
        assert!(matches!(
            RoninChain::new("https://api.roninchain.com/rpc", "0x12", "0x12"),
            Err(ApiError::Chain(_))
        ));
    }
}
