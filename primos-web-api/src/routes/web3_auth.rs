use crate::dto::{respond, ApiResponse, AuthToken};
use crate::error::{ApiError, Result};
use crate::pool::LoyaltyConfig;
use crate::wallet;
use alloy::primitives::Signature;
use chrono::{DateTime, Days, Utc};
use hmac::{Hmac, Mac};
use jwt::token::verified::VerifyWithKey;
use jwt::SignWithKey;
use rocket::State;
use sha2::Sha256;
use std::{collections::BTreeMap, str::FromStr};
use tracing::{info, warn};

#[get("/auth/login?<wallet_address>&<message>&<signature>")]
pub async fn login(
    config: &State<LoyaltyConfig>,
    wallet_address: Option<String>,
    message: Option<String>,
    signature: Option<String>,
) -> ApiResponse<String> {
    let result = (|| {
        let wallet_address = wallet::normalize_address(&wallet_address.unwrap_or_default())?;
        let message = message.filter(|m| !m.is_empty()).ok_or_else(|| {
            ApiError::BadRequest("'message' and 'signature' are required".to_owned())
        })?;
        let signature = signature.filter(|s| !s.is_empty()).ok_or_else(|| {
            ApiError::BadRequest("'message' and 'signature' are required".to_owned())
        })?;

        if !verify_wallet_signature(&wallet_address, &message, &signature)? {
            return Err(ApiError::BadRequest(
                "Signature verification failed".to_owned(),
            ));
        }
        generate_jwt_token(&wallet_address, &message, &config.jwt_key, Utc::now())
    })();
    respond(result, "Login failed")
}

#[get("/auth/verify?<wallet_address>&<jwt_token>")]
pub async fn verify(
    config: &State<LoyaltyConfig>,
    wallet_address: String,
    jwt_token: String,
) -> ApiResponse<String> {
    let status = if verify_jwt_token(&config.jwt_key, &wallet_address, &jwt_token, Utc::now()) {
        "successful".to_owned()
    } else {
        "failed".to_owned()
    };
    respond(Ok(status), "Verify")
}

/// True when `signature` is an EIP-191 personal signature of `message` by
/// `wallet_address`.
pub fn verify_wallet_signature(wallet_address: &str, message: &str, signature: &str) -> Result<bool> {
    let expected = wallet::parse_address(wallet_address)?;
    let signature = Signature::from_str(signature.trim()).map_err(|error| {
        warn!("Bad signature: {}", error);
        ApiError::BadRequest("Not valid signature".to_owned())
    })?;
    match signature.recover_address_from_msg(message.as_bytes()) {
        Ok(signer) => Ok(signer == expected),
        Err(error) => {
            info!("Signer recovery failed: {}", error);
            Ok(false)
        }
    }
}

fn jwt_key(jwt_key: &str) -> Result<Hmac<Sha256>> {
    Hmac::new_from_slice(jwt_key.as_bytes()).map_err(|error| {
        warn!("Invalid key: {}", error);
        ApiError::Unauthorized("Invalid key".to_owned())
    })
}

pub fn generate_jwt_token(
    wallet_address: &str,
    message: &str,
    jwt_key_text: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let key = jwt_key(jwt_key_text)?;
    let expiry = now
        .checked_add_days(Days::new(1))
        .ok_or_else(|| ApiError::BadRequest("Bad expiry".to_owned()))?
        .to_rfc3339();

    let mut claims: BTreeMap<&str, &str> = BTreeMap::new();
    claims.insert("wallet", wallet_address);
    claims.insert("message", message);
    claims.insert("expiry", &expiry);

    claims
        .sign_with_key(&key)
        .map_err(|error| ApiError::Unauthorized(error.to_string()))
}

pub fn verify_jwt_token(
    jwt_key_text: &str,
    wallet_address: &str,
    jwt_token: &str,
    now: DateTime<Utc>,
) -> bool {
    let key = match jwt_key(jwt_key_text) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let claims: BTreeMap<String, String> = match jwt_token.verify_with_key(&key) {
        Ok(claims) => claims,
        Err(error) => {
            info!("JWT verification error: {}", error);
            warn!("Invalid JWT token passed!");
            return false;
        }
    };
    match claims.get("wallet") {
        Some(wallet) if wallet.eq_ignore_ascii_case(wallet_address.trim()) => {}
        _ => {
            info!("Wrong wallet in JWT token");
            return false;
        }
    }

    let expiry = match claims
        .get("expiry")
        .map(|expiry| DateTime::parse_from_rfc3339(expiry))
    {
        Some(Ok(expiry)) => expiry.with_timezone(&Utc),
        _ => {
            warn!("Bad expiry in JWT token");
            return false;
        }
    };
    if now <= expiry {
        true
    } else {
        info!("JWT token is expired");
        false
    }
}

/// With `enforce_wallet_auth` on, requires a bearer token issued to `wallet_address`.
pub fn authorize(
    config: &LoyaltyConfig,
    token: Option<&AuthToken<'_>>,
    wallet_address: &str,
) -> Result<()> {
    if !config.enforce_wallet_auth {
        return Ok(());
    }
    match token {
        Some(token) if verify_jwt_token(&config.jwt_key, wallet_address, token.token(), Utc::now()) => {
            Ok(())
        }
        Some(_) => Err(ApiError::Unauthorized("Invalid or expired token".to_owned())),
        None => Err(ApiError::Unauthorized("Authorization required".to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;
    use chrono::{Duration, TimeZone};

    const KEY: &str = "test-jwt-key";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn jwt_round_trip_checks_wallet_and_expiry() {
        let wallet = "0x00000000000000000000000000000000000000aa";
        let token = generate_jwt_token(wallet, "Sign in to Primos", KEY, now()).unwrap();

        assert!(verify_jwt_token(KEY, wallet, &token, now()));
        assert!(verify_jwt_token(
            KEY,
            "0x00000000000000000000000000000000000000AA",
            &token,
            now() + Duration::hours(23)
        ));
        assert!(!verify_jwt_token(KEY, wallet, &token, now() + Duration::days(2)));
        assert!(!verify_jwt_token(
            KEY,
            "0x00000000000000000000000000000000000000bb",
            &token,
            now()
        ));
        assert!(!verify_jwt_token("other-key", wallet, &token, now()));
    }

    #[test]
    fn personal_signature_recovers_signer() {
        // well-known development key
        let signer = PrivateKeySigner::from_str(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        let wallet = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
        assert_eq!(signer.address().to_string().to_lowercase(), wallet);
        let message = "Sign in to Primos";
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        let signature = format!("0x{}", alloy::hex::encode(signature.as_bytes()));

        assert!(verify_wallet_signature(wallet, message, &signature).unwrap());
        assert!(!verify_wallet_signature(wallet, "another message", &signature).unwrap());
        assert!(verify_wallet_signature(wallet, message, "0x1234").is_err());
    }
}
