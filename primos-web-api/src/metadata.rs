use crate::error::{ApiError, Result};
use crate::points::NftMetadata;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

const IPFS_SCHEME: &str = "ipfs://";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            initial_delay: Duration::from_millis(1_000),
            backoff_factor: 2,
        }
    }
}

/// Runs `operation` until it succeeds or `policy.attempts` are spent,
/// sleeping between attempts with exponential backoff.
pub async fn retry_operation<T, F, Fut>(
    policy: RetryPolicy,
    description: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt >= attempts => {
                warn!("{} failed after {} attempts: {}", description, attempt, error);
                return Err(error);
            }
            Err(error) => {
                info!(
                    "{} attempt {}/{} failed: {}. Retrying in {:?}",
                    description, attempt, attempts, error, delay
                );
                sleep(delay).await;
                delay = delay * policy.backoff_factor;
                attempt += 1;
            }
        }
    }
}

/// Rewrites `ipfs://<cid>` to `<gateway>/<cid>`; other URIs are returned unchanged.
pub fn resolve_uri(uri: &str, ipfs_gateway: &str) -> String {
    match uri.strip_prefix(IPFS_SCHEME) {
        Some(path) => format!("{}/{}", ipfs_gateway.trim_end_matches('/'), path),
        None => uri.to_owned(),
    }
}

/// Fetches token metadata JSON from a token URI. Only `ipfs://` and `http(s)`
/// URIs are fetched; anything else yields `None`.
pub async fn fetch_metadata(
    client: &reqwest::Client,
    token_uri: &str,
    ipfs_gateway: &str,
    policy: RetryPolicy,
) -> Result<Option<NftMetadata>> {
    if token_uri.is_empty() {
        return Ok(None);
    }
    if !token_uri.starts_with(IPFS_SCHEME) && !token_uri.starts_with("http") {
        warn!("Unsupported token URI scheme: {}", token_uri);
        return Ok(None);
    }

    let url = resolve_uri(token_uri, ipfs_gateway);
    let description = format!("Fetch metadata {}", url);
    let url = &url;
    let metadata = retry_operation(policy, &description, move || async move {
        let response = client
            .get(url)
            .header("User-Agent", "Primos Web Api")
            .send()
            .await
            .map_err(|error| ApiError::Metadata(error.to_string()))?
            .error_for_status()
            .map_err(|error| ApiError::Metadata(error.to_string()))?;
        response
            .json::<NftMetadata>()
            .await
            .map_err(|error| ApiError::Metadata(error.to_string()))
    })
    .await?;
    Ok(Some(metadata))
}

/// HTTP client, gateway and retry settings shared by every metadata read.
#[derive(Clone, Debug)]
pub struct MetadataFetcher {
    client: reqwest::Client,
    ipfs_gateway: String,
    policy: RetryPolicy,
}

impl MetadataFetcher {
    pub fn new(client: reqwest::Client, ipfs_gateway: &str, policy: RetryPolicy) -> Self {
        MetadataFetcher {
            client,
            ipfs_gateway: ipfs_gateway.to_owned(),
            policy,
        }
    }

    pub fn resolve(&self, uri: &str) -> String {
        resolve_uri(uri, &self.ipfs_gateway)
    }

    /// Like [`fetch_metadata`], but a failed fetch is logged and read as "no metadata".
    pub async fn fetch_or_none(&self, token_uri: &str) -> Option<NftMetadata> {
        match fetch_metadata(&self.client, token_uri, &self.ipfs_gateway, self.policy).await {
            Ok(metadata) => metadata,
            Err(error) => {
                warn!("No metadata for {}: {}", token_uri, error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            initial_delay: Duration::from_millis(1),
            backoff_factor: 2,
        }
    }

    #[test]
    fn ipfs_uris_use_gateway() {
        assert_eq!(
            resolve_uri("ipfs://QmHash/12.json", "https://ipfs.io/ipfs/"),
            "https://ipfs.io/ipfs/QmHash/12.json"
        );
        assert_eq!(
            resolve_uri("https://meta.example/12.json", "https://ipfs.io/ipfs"),
            "https://meta.example/12.json"
        );
    }

    #[tokio::test]
    async fn retry_stops_at_first_success() {
        let calls = AtomicU32::new(0);
        let result = retry_operation(quick_policy(3), "flaky", || {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if call < 2 {
                    Err(ApiError::Metadata("timeout".to_owned()))
                } else {
                    Ok(call)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_operation(quick_policy(3), "down", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ApiError::Metadata("503".to_owned())) }
        })
        .await;
        assert!(matches!(result, Err(ApiError::Metadata(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unsupported_scheme_is_skipped() {
        let client = reqwest::Client::new();
        let metadata = fetch_metadata(&client, "ar://tx", "https://ipfs.io/ipfs", quick_policy(1))
            .await
            .unwrap();
        assert!(metadata.is_none());
    }
}
