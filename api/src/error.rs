//! The VSS error taxonomy (spec §7).
//!
//! Every fallible operation in this crate returns a [`VssError`]. The variant
//! chosen determines the HTTP status and wire [`crate::types::ErrorCode`] the
//! transport layer maps it to; see `server::vss_service::get_error_status_code`
//! and `build_error_response`.

use std::fmt;

/// Taxonomy of failures a [`crate::kv_store::KvStore`] or
/// [`crate::auth::Authorizer`] can surface.
///
/// Conflict is not logged as an error upstream (spec §7): it is a first-class,
/// expected, retryable outcome of optimistic concurrency, not a bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VssError {
	/// A conditional write affected zero rows: the caller's view is stale.
	/// Retry after a fresh `get`.
	ConflictError(String),
	/// The request was malformed: undecodable payload, missing required
	/// field, empty `store_id`, an oversized `key`/`user_token`, duplicate
	/// keys across `transaction_items`/`delete_items`, or too many items in
	/// one `put`.
	InvalidRequestError(String),
	/// `get` was called for a key that does not exist and is not the
	/// reserved global-version key.
	NoSuchKeyError(String),
	/// The authorizer rejected the request: missing/invalid/expired
	/// credentials, or a `user_token` exceeding
	/// [`crate::kv_store::MAX_USER_TOKEN_LENGTH`].
	AuthError(String),
	/// Backend I/O failure, pool exhaustion, or any other unexpected
	/// condition not attributable to the caller. The message is for logs
	/// only; it is never sent to the client (see `build_error_response`).
	InternalServerError(String),
}

impl fmt::Display for VssError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			VssError::ConflictError(msg) => write!(f, "Conflict: {msg}"),
			VssError::InvalidRequestError(msg) => write!(f, "Invalid request: {msg}"),
			VssError::NoSuchKeyError(msg) => write!(f, "No such key: {msg}"),
			VssError::AuthError(msg) => write!(f, "Auth error: {msg}"),
			VssError::InternalServerError(msg) => write!(f, "Internal server error: {msg}"),
		}
	}
}

impl std::error::Error for VssError {}

impl From<std::io::Error> for VssError {
	fn from(e: std::io::Error) -> Self {
		VssError::InternalServerError(e.to_string())
	}
}
