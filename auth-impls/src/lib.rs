//! Concrete [`api::auth::Authorizer`] implementations.
//!
//! Enable `jwt` for RSA-signed bearer tokens, `sigs` for Lightning-node
//! signature authentication, or both (the server tries JWT first and falls
//! back to signature auth, per `server`'s `main.rs`).

#[cfg(feature = "jwt")]
pub mod jwt;
#[cfg(feature = "sigs")]
pub mod signature;

/// The maximum length, in bytes, of a `user_token` any authorizer in this
/// crate will produce. Mirrors `api::kv_store::MAX_USER_TOKEN_LENGTH` and
/// the `user_token` database column width (spec §9) — these three must
/// never drift apart.
pub const MAX_USER_TOKEN_LENGTH: usize = 120;
