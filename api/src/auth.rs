//! The `Authorizer` trait: the external collaborator that turns request
//! headers into an authenticated `user_token` (spec §6, "Authorizer
//! interface").

use crate::error::VssError;
use async_trait::async_trait;
use std::collections::HashMap;

/// The outcome of a successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
	/// An opaque, non-empty identifier for the authenticated principal.
	/// The engine never parses this; it is used only to scope storage.
	pub user_token: String,
}

/// Verifies request headers and extracts a `user_token`.
///
/// Implementations must never fail open: a missing, malformed, or expired
/// credential is [`VssError::AuthError`], not a fallback identity. The
/// engine treats `user_token` as opaque.
#[async_trait]
pub trait Authorizer: Send + Sync {
	/// Verifies `headers` and returns the authenticated user's token, or
	/// [`VssError::AuthError`] if verification fails for any reason.
	async fn verify(&self, headers: &HashMap<String, String>) -> Result<AuthResponse, VssError>;
}

/// An authorizer that accepts every request under a single fixed identity.
///
/// Valid only for trusted, single-tenant deployments (spec §6): since every
/// caller is commingled under the same `user_token`, tenant isolation (P6)
/// does not hold across distinct callers, only across distinct stores.
#[cfg(feature = "_test_utils")]
pub struct NoopAuthorizer;

#[cfg(feature = "_test_utils")]
#[async_trait]
impl Authorizer for NoopAuthorizer {
	async fn verify(&self, _headers: &HashMap<String, String>) -> Result<AuthResponse, VssError> {
		Ok(AuthResponse { user_token: "unauth-user".to_string() })
	}
}
