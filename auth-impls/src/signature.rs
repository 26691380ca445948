//! Signature-based `Authorizer`: verifies a detached secp256k1 ECDSA
//! signature over a timestamped, domain-separated challenge, LNURL-auth
//! style, and uses the signing (linking) public key as the `user_token`.
//!
//! This matches the linking-key identity model used by VSS clients that
//! authenticate via a BIP32-derived linking key rather than a bearer
//! token (see e.g. `vss-rust-client-ffi`'s `lnurl_auth` client mode): the
//! client signs a server-verifiable challenge with its linking private
//! key, and the server treats the corresponding public key as the stable
//! tenant identity.

use crate::MAX_USER_TOKEN_LENGTH;
use api::auth::{AuthResponse, Authorizer};
use api::error::VssError;
use async_trait::async_trait;
use bitcoin_hashes::{Hash, sha256};
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, SECP256K1};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Requests whose timestamp header is further than this many seconds from
/// "now" (in either direction) are rejected, to bound replay of a captured
/// signature.
const MAX_CLOCK_SKEW_SECS: i64 = 300;

const DOMAIN_TAG: &[u8] = b"VSS-AUTH";

const PUBKEY_HEADER: &str = "vss-auth-pubkey";
const SIGNATURE_HEADER: &str = "vss-auth-signature";
const TIMESTAMP_HEADER: &str = "vss-auth-timestamp";

/// Verifies the `vss-auth-*` header triple against a recomputed challenge
/// digest. See module docs for the signing scheme.
pub struct SignatureValidatingAuthorizer;

fn challenge_digest(pubkey_hex: &str, timestamp: &str) -> sha256::Hash {
	let mut preimage = Vec::with_capacity(DOMAIN_TAG.len() + pubkey_hex.len() + timestamp.len() + 2);
	preimage.extend_from_slice(DOMAIN_TAG);
	preimage.push(b':');
	preimage.extend_from_slice(pubkey_hex.as_bytes());
	preimage.push(b':');
	preimage.extend_from_slice(timestamp.as_bytes());
	sha256::Hash::hash(&preimage)
}

#[async_trait]
impl Authorizer for SignatureValidatingAuthorizer {
	async fn verify(&self, headers: &HashMap<String, String>) -> Result<AuthResponse, VssError> {
		let pubkey_hex = headers
			.get(PUBKEY_HEADER)
			.ok_or_else(|| VssError::AuthError(format!("missing {PUBKEY_HEADER} header")))?;
		let signature_hex = headers
			.get(SIGNATURE_HEADER)
			.ok_or_else(|| VssError::AuthError(format!("missing {SIGNATURE_HEADER} header")))?;
		let timestamp_str = headers
			.get(TIMESTAMP_HEADER)
			.ok_or_else(|| VssError::AuthError(format!("missing {TIMESTAMP_HEADER} header")))?;

		if pubkey_hex.len() > MAX_USER_TOKEN_LENGTH {
			return Err(VssError::AuthError(format!(
				"pubkey exceeds {MAX_USER_TOKEN_LENGTH} characters"
			)));
		}

		let timestamp: i64 = timestamp_str
			.parse()
			.map_err(|_| VssError::AuthError(format!("{TIMESTAMP_HEADER} is not a valid integer")))?;
		let now = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_err(|e| VssError::AuthError(format!("system clock error: {e}")))?
			.as_secs() as i64;
		if (now - timestamp).abs() > MAX_CLOCK_SKEW_SECS {
			return Err(VssError::AuthError("timestamp outside acceptable window".to_string()));
		}

		let pubkey_bytes: Vec<u8> = hex_conservative::FromHex::from_hex(pubkey_hex.as_str())
			.map_err(|e| VssError::AuthError(format!("invalid hex pubkey: {e}")))?;
		let pubkey = PublicKey::from_slice(&pubkey_bytes)
			.map_err(|e| VssError::AuthError(format!("invalid secp256k1 pubkey: {e}")))?;

		let sig_bytes: Vec<u8> = hex_conservative::FromHex::from_hex(signature_hex.as_str())
			.map_err(|e| VssError::AuthError(format!("invalid hex signature: {e}")))?;
		let signature = Signature::from_der(&sig_bytes)
			.map_err(|e| VssError::AuthError(format!("invalid DER signature: {e}")))?;

		let digest = challenge_digest(pubkey_hex, timestamp_str);
		let message = Message::from_digest(digest.to_byte_array());

		SECP256K1
			.verify_ecdsa(&message, &signature, &pubkey)
			.map_err(|_| VssError::AuthError("signature verification failed".to_string()))?;

		Ok(AuthResponse { user_token: pubkey_hex.clone() })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hex_conservative::DisplayHex;
	use secp256k1::{Secp256k1, SecretKey};

	fn sign_headers(secret_key: &SecretKey, timestamp: i64) -> HashMap<String, String> {
		let secp = Secp256k1::new();
		let pubkey = PublicKey::from_secret_key(&secp, secret_key);
		let pubkey_hex = pubkey.serialize().to_lower_hex_string();
		let timestamp_str = timestamp.to_string();
		let digest = challenge_digest(&pubkey_hex, &timestamp_str);
		let message = Message::from_digest(digest.to_byte_array());
		let signature = secp.sign_ecdsa(&message, secret_key);

		let mut headers = HashMap::new();
		headers.insert(PUBKEY_HEADER.to_string(), pubkey_hex);
		headers.insert(SIGNATURE_HEADER.to_string(), signature.serialize_der().to_lower_hex_string());
		headers.insert(TIMESTAMP_HEADER.to_string(), timestamp_str);
		headers
	}

	fn now() -> i64 {
		SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
	}

	#[tokio::test]
	async fn accepts_valid_signature() {
		let secret_key = SecretKey::from_slice(&[7u8; 32]).unwrap();
		let headers = sign_headers(&secret_key, now());

		let resp = SignatureValidatingAuthorizer.verify(&headers).await.unwrap();
		assert_eq!(resp.user_token.len(), 66); // compressed pubkey, hex-encoded
	}

	#[tokio::test]
	async fn rejects_stale_timestamp() {
		let secret_key = SecretKey::from_slice(&[7u8; 32]).unwrap();
		let headers = sign_headers(&secret_key, now() - 10_000);

		let err = SignatureValidatingAuthorizer.verify(&headers).await.unwrap_err();
		assert!(matches!(err, VssError::AuthError(_)));
	}

	#[tokio::test]
	async fn rejects_signature_from_wrong_key() {
		let secret_key = SecretKey::from_slice(&[7u8; 32]).unwrap();
		let other_key = SecretKey::from_slice(&[9u8; 32]).unwrap();
		let mut headers = sign_headers(&secret_key, now());

		let secp = Secp256k1::new();
		let other_pubkey = PublicKey::from_secret_key(&secp, &other_key);
		headers.insert(PUBKEY_HEADER.to_string(), other_pubkey.serialize().to_lower_hex_string());

		let err = SignatureValidatingAuthorizer.verify(&headers).await.unwrap_err();
		assert!(matches!(err, VssError::AuthError(_)));
	}

	#[tokio::test]
	async fn rejects_missing_headers() {
		let err = SignatureValidatingAuthorizer.verify(&HashMap::new()).await.unwrap_err();
		assert!(matches!(err, VssError::AuthError(_)));
	}
}
