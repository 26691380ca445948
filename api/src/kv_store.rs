//! The `KvStore` trait: the engine-facing contract a `RecordStore` adapter
//! implements (spec §4.1, §4.4).

use crate::error::VssError;
use crate::types::{
	DeleteObjectRequest, DeleteObjectResponse, GetObjectRequest, GetObjectResponse,
	ListKeyVersionsRequest, ListKeyVersionsResponse, PutObjectRequest, PutObjectResponse,
};
use async_trait::async_trait;

/// The reserved key under which a store's global version is kept. Never
/// surfaced in `list_key_versions` results (spec §3, §4.3 P5).
pub const GLOBAL_VERSION_KEY: &str = "vss_global_version";

/// The stored version of a key on its first successful write, whether by
/// insert-if-absent (`version == 0`) or unconditional upsert
/// (`version == -1`).
pub const INITIAL_RECORD_VERSION: i64 = 1;

/// The maximum length, in bytes, of a `user_token`. Kept in lockstep with
/// `auth_impls::MAX_USER_TOKEN_LENGTH` and the `user_token` column width
/// (spec §9).
pub const MAX_USER_TOKEN_LENGTH: usize = 120;

/// The maximum length, in bytes, of a `key`.
pub const MAX_KEY_LENGTH: usize = 600;

/// Implemented by a backend adapter that can durably and transactionally
/// serve the versioning engine's four operations for an authenticated
/// `user_token`.
///
/// Implementations must uphold read-committed isolation on `get`, and
/// all-or-nothing commit on `put`/`delete` (spec §4.1, §5): either every
/// conditional op in the batch affects at least one row and the whole
/// transaction commits, or any single zero-row op aborts the entire
/// transaction and the call fails with [`VssError::ConflictError`].
#[async_trait]
pub trait KvStore: Send + Sync {
	/// Reads the current value and version of `(user, store, key)`.
	///
	/// Returns a synthetic `{version: 0, value: empty}` record when `key`
	/// is [`GLOBAL_VERSION_KEY`] and no reserved row exists yet. For any
	/// other missing key, fails with [`VssError::NoSuchKeyError`].
	async fn get(
		&self, user_token: String, request: GetObjectRequest,
	) -> Result<GetObjectResponse, VssError>;

	/// Atomically applies `transaction_items` (conditional/unconditional
	/// writes) and `delete_items` (conditional/unconditional deletes), plus
	/// an optional global-version bump, as a single transaction.
	async fn put(
		&self, user_token: String, request: PutObjectRequest,
	) -> Result<PutObjectResponse, VssError>;

	/// Deletes a single key, honoring the same version policy as a batched
	/// delete item, in its own transaction.
	async fn delete(
		&self, user_token: String, request: DeleteObjectRequest,
	) -> Result<DeleteObjectResponse, VssError>;

	/// Returns a page of `(key, version)` pairs ordered by key, with the
	/// snapshot-safety property described in spec §4.3.
	async fn list_key_versions(
		&self, user_token: String, request: ListKeyVersionsRequest,
	) -> Result<ListKeyVersionsResponse, VssError>;
}
