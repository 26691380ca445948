//! Wire types, error taxonomy, and collaborator traits ([`KvStore`](kv_store::KvStore),
//! [`Authorizer`](auth::Authorizer)) shared by every VSS crate.
//!
//! This crate has no opinion on transport or storage backend; it only
//! defines the contract those pieces must meet. See `impls` for the
//! PostgreSQL `KvStore`, `auth-impls` for concrete `Authorizer`s, and
//! `server` for the HTTP transport wiring it all together.

pub mod auth;
pub mod error;
pub mod kv_store;
pub mod test_support;
pub mod types;
