//! JWT-based `Authorizer`: verifies an RS256-signed bearer token and
//! extracts the `sub` claim as the `user_token`.

use crate::MAX_USER_TOKEN_LENGTH;
use api::auth::{AuthResponse, Authorizer};
use api::error::VssError;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize)]
struct Claims {
	sub: String,
}

/// Verifies a `Authorization: Bearer <jwt>` header against a fixed RSA
/// public key using RS256, trusting the token's `sub` claim as the
/// `user_token`.
pub struct JWTAuthorizer {
	decoding_key: DecodingKey,
	validation: Validation,
}

impl JWTAuthorizer {
	/// Builds a `JWTAuthorizer` from an RSA public key in PEM format.
	pub async fn new(rsa_pem: &str) -> Result<Self, jsonwebtoken::errors::Error> {
		let decoding_key = DecodingKey::from_rsa_pem(rsa_pem.as_bytes())?;
		let mut validation = Validation::new(Algorithm::RS256);
		validation.validate_exp = true;
		Ok(Self { decoding_key, validation })
	}
}

#[async_trait]
impl Authorizer for JWTAuthorizer {
	async fn verify(&self, headers: &HashMap<String, String>) -> Result<AuthResponse, VssError> {
		let header_value = headers
			.get("authorization")
			.ok_or_else(|| VssError::AuthError("missing Authorization header".to_string()))?;

		let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
			VssError::AuthError("Authorization header is not a Bearer token".to_string())
		})?;

		let decoded = decode::<Claims>(token, &self.decoding_key, &self.validation)
			.map_err(|e| VssError::AuthError(format!("invalid JWT: {e}")))?;

		let user_token = decoded.claims.sub;
		if user_token.is_empty() {
			return Err(VssError::AuthError("JWT `sub` claim is empty".to_string()));
		}
		if user_token.len() > MAX_USER_TOKEN_LENGTH {
			return Err(VssError::AuthError(format!(
				"JWT `sub` claim exceeds {MAX_USER_TOKEN_LENGTH} characters"
			)));
		}

		Ok(AuthResponse { user_token })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use jsonwebtoken::{EncodingKey, Header, encode};

	// 2048-bit RSA test keypair, for signing/verifying fixtures only.
	const TEST_PRIVATE_KEY_PEM: &str = include_str!("../testdata/test_rsa_private.pem");
	const TEST_PUBLIC_KEY_PEM: &str = include_str!("../testdata/test_rsa_public.pem");

	fn sign(sub: &str, exp: usize) -> String {
		#[derive(serde::Serialize)]
		struct TestClaims<'a> {
			sub: &'a str,
			exp: usize,
		}
		let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY_PEM.as_bytes()).unwrap();
		encode(&Header::new(Algorithm::RS256), &TestClaims { sub, exp }, &key).unwrap()
	}

	#[tokio::test]
	async fn accepts_valid_token() {
		let authorizer = JWTAuthorizer::new(TEST_PUBLIC_KEY_PEM).await.unwrap();
		let token = sign("alice", 9_999_999_999);
		let mut headers = HashMap::new();
		headers.insert("authorization".to_string(), format!("Bearer {token}"));

		let resp = authorizer.verify(&headers).await.unwrap();
		assert_eq!(resp.user_token, "alice");
	}

	#[tokio::test]
	async fn rejects_missing_header() {
		let authorizer = JWTAuthorizer::new(TEST_PUBLIC_KEY_PEM).await.unwrap();
		let err = authorizer.verify(&HashMap::new()).await.unwrap_err();
		assert!(matches!(err, VssError::AuthError(_)));
	}

	#[tokio::test]
	async fn rejects_expired_token() {
		let authorizer = JWTAuthorizer::new(TEST_PUBLIC_KEY_PEM).await.unwrap();
		let token = sign("alice", 1);
		let mut headers = HashMap::new();
		headers.insert("authorization".to_string(), format!("Bearer {token}"));

		let err = authorizer.verify(&headers).await.unwrap_err();
		assert!(matches!(err, VssError::AuthError(_)));
	}
}
