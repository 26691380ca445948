//! Wire types for the VSS protocol (spec §6).
//!
//! These mirror `proto/vss.proto` field-for-field and derive
//! [`prost::Message`] so they can be encoded/decoded directly from HTTP
//! request/response bodies. Kept hand-in-sync with the `.proto` file;
//! regenerate with `cargo build -p api --features genproto` (gated behind
//! the `genproto` cfg, see `build.rs`) to check the two haven't drifted.

use bytes::Bytes;

/// A single key/version/value triple, as used in both requests and
/// responses.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct KeyValue {
	/// The key, namespaced under `(user_token, store_id)`.
	#[prost(string, tag = "1")]
	pub key: ::prost::alloc::string::String,
	/// Server-maintained monotone version. See spec §3/§4.1 for the
	/// client-supplied-vs-stored distinction: this field means different
	/// things on the way in (a condition) and on the way out (a fact).
	#[prost(int64, tag = "2")]
	pub version: i64,
	/// Opaque bytes. The server never parses or validates this.
	#[prost(bytes = "bytes", tag = "3")]
	pub value: Bytes,
}

/// `POST /vss/getObject` request body.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct GetObjectRequest {
	#[prost(string, tag = "1")]
	pub store_id: ::prost::alloc::string::String,
	#[prost(string, tag = "2")]
	pub key: ::prost::alloc::string::String,
}

/// `POST /vss/getObject` response body.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetObjectResponse {
	#[prost(message, optional, tag = "1")]
	pub value: Option<KeyValue>,
}

/// `POST /vss/putObjects` request body.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PutObjectRequest {
	#[prost(string, tag = "1")]
	pub store_id: ::prost::alloc::string::String,
	/// When present, the server additionally conditions the whole batch on
	/// the store's reserved global-version row (spec §4.2).
	#[prost(int64, optional, tag = "2")]
	pub global_version: Option<i64>,
	#[prost(message, repeated, tag = "3")]
	pub transaction_items: ::prost::alloc::vec::Vec<KeyValue>,
	#[prost(message, repeated, tag = "4")]
	pub delete_items: ::prost::alloc::vec::Vec<KeyValue>,
}

/// `POST /vss/putObjects` response body. Empty on success.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct PutObjectResponse {}

/// `POST /vss/deleteObject` request body.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteObjectRequest {
	#[prost(string, tag = "1")]
	pub store_id: ::prost::alloc::string::String,
	#[prost(message, optional, tag = "2")]
	pub key_value: Option<KeyValue>,
}

/// `POST /vss/deleteObject` response body. Empty on success.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct DeleteObjectResponse {}

/// `POST /vss/listKeyVersions` request body.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ListKeyVersionsRequest {
	#[prost(string, tag = "1")]
	pub store_id: ::prost::alloc::string::String,
	#[prost(string, optional, tag = "2")]
	pub key_prefix: Option<::prost::alloc::string::String>,
	#[prost(int32, optional, tag = "3")]
	pub page_size: Option<i32>,
	#[prost(string, optional, tag = "4")]
	pub page_token: Option<::prost::alloc::string::String>,
}

/// `POST /vss/listKeyVersions` response body.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListKeyVersionsResponse {
	#[prost(message, repeated, tag = "1")]
	pub key_versions: ::prost::alloc::vec::Vec<KeyValue>,
	/// Last returned key, or empty string on an empty page. A non-empty
	/// token does *not* imply more data exists (spec §4.3) — clients poll
	/// until a page comes back empty.
	#[prost(string, optional, tag = "2")]
	pub next_page_token: Option<::prost::alloc::string::String>,
	/// Only set on the first page (no `page_token` in the request). See
	/// the snapshot-safety rule in spec §4.3.
	#[prost(int64, optional, tag = "3")]
	pub global_version: Option<i64>,
}

/// Body of a non-2xx response from any VSS endpoint.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ErrorResponse {
	#[prost(enumeration = "ErrorCode", tag = "1")]
	pub error_code: i32,
	#[prost(string, tag = "2")]
	pub message: ::prost::alloc::string::String,
}

/// Wire error taxonomy. See [`crate::error::VssError`] for the in-process
/// equivalent and the HTTP status mapping in spec §6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ErrorCode {
	/// Should never be sent; present only so `0` is a defined default.
	UnknownException = 0,
	ConflictException = 1,
	InvalidRequestException = 2,
	InternalServerException = 3,
	NoSuchKeyException = 4,
	AuthException = 5,
}

#[cfg(feature = "_test_utils")]
mod arbitrary {
	use super::KeyValue;
	use bytes::Bytes;
	use rand::Rng;

	impl KeyValue {
		/// Builds a `KeyValue` with a random key/value, for tests that need
		/// distinct keys without caring about their content.
		pub fn random(version: i64) -> Self {
			let mut rng = rand::thread_rng();
			let key: String = (0..16).map(|_| rng.sample(rand::distributions::Alphanumeric) as char).collect();
			let value: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
			KeyValue { key, version, value: Bytes::from(value) }
		}
	}

	/// Generates a random store id, so concurrent test runs against a
	/// shared live database don't collide.
	pub fn random_store_id(prefix: &str) -> String {
		let suffix: u64 = rand::thread_rng().gen();
		format!("{prefix}-{suffix:016x}")
	}
}

#[cfg(feature = "_test_utils")]
pub use arbitrary::random_store_id;
