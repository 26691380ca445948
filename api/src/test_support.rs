//! A backend-agnostic conformance suite for [`crate::kv_store::KvStore`]
//! implementations, exercising the testable properties and literal
//! end-to-end scenarios from spec §8.
//!
//! Any `RecordStore` adapter crate can check itself against this suite with
//! a single macro invocation:
//!
//! ```ignore
//! api::define_kv_store_tests!(
//!     my_backend_tests,
//!     MyBackend,
//!     MyBackend::new("connection-string").await.unwrap()
//! );
//! ```
//!
//! Requires the invoking crate to depend on `api` with the `_test_utils`
//! feature enabled (for [`crate::types::random_store_id`]) and on `tokio`
//! with the `rt-multi-thread`/`macros` features (for `#[tokio::test]`).

/// Expands to a `#[cfg(test)]` module running the shared VSS conformance
/// suite against `$init` (an async expression yielding a `$store_ty`).
///
/// Every generated test is `#[ignore]`: the suite needs a live backend
/// (e.g. a reachable PostgreSQL instance), so it is opt-in via
/// `cargo test -- --ignored`, the same convention `impls` already used for
/// its Postgres-backed tests before this exercise.
#[macro_export]
macro_rules! define_kv_store_tests {
	($test_mod:ident, $store_ty:ty, $init:expr) => {
		#[cfg(test)]
		mod $test_mod {
			#![allow(unused_imports)]
			use $crate::kv_store::{GLOBAL_VERSION_KEY, KvStore};
			use $crate::types::{
				DeleteObjectRequest, GetObjectRequest, KeyValue, ListKeyVersionsRequest,
				PutObjectRequest, random_store_id,
			};
			use bytes::Bytes;

			async fn new_store() -> $store_ty {
				$init
			}

			fn kv(key: &str, version: i64, value: &str) -> KeyValue {
				KeyValue {
					key: key.to_string(),
					version,
					value: Bytes::from(value.as_bytes().to_vec()),
				}
			}

			fn put_req(store_id: &str, global_version: Option<i64>, items: Vec<KeyValue>) -> PutObjectRequest {
				PutObjectRequest {
					store_id: store_id.to_string(),
					global_version,
					transaction_items: items,
					delete_items: Vec::new(),
				}
			}

			// Scenario 1: first-write success.
			#[tokio::test]
			#[ignore]
			async fn first_write_success() {
				let store = new_store().await;
				let user = random_store_id("user");
				let store_id = random_store_id("store");

				store
					.put(user.clone(), put_req(&store_id, Some(0), vec![kv("k1", 0, "k1v1")]))
					.await
					.expect("first write should succeed");

				let got = store
					.get(user.clone(), GetObjectRequest { store_id: store_id.clone(), key: "k1".to_string() })
					.await
					.unwrap()
					.value
					.unwrap();
				assert_eq!(got.version, 1);
				assert_eq!(got.value, Bytes::from_static(b"k1v1"));

				let global = store
					.get(user, GetObjectRequest { store_id, key: GLOBAL_VERSION_KEY.to_string() })
					.await
					.unwrap()
					.value
					.unwrap();
				assert_eq!(global.version, 1);
			}

			// Scenario 2: a stale put is rejected and leaves prior state untouched.
			#[tokio::test]
			#[ignore]
			async fn conflicting_second_write_is_rejected() {
				let store = new_store().await;
				let user = random_store_id("user");
				let store_id = random_store_id("store");

				store
					.put(user.clone(), put_req(&store_id, Some(0), vec![kv("k1", 0, "k1v1")]))
					.await
					.unwrap();

				let err = store
					.put(user.clone(), put_req(&store_id, Some(1), vec![kv("k1", 0, "x")]))
					.await
					.unwrap_err();
				assert!(matches!(err, $crate::error::VssError::ConflictError(_)));

				let got = store
					.get(user, GetObjectRequest { store_id, key: "k1".to_string() })
					.await
					.unwrap()
					.value
					.unwrap();
				assert_eq!(got.version, 1);
				assert_eq!(got.value, Bytes::from_static(b"k1v1"));
			}

			// Scenario 3 / P2: a multi-item put is all-or-nothing.
			#[tokio::test]
			#[ignore]
			async fn multi_item_put_is_atomic() {
				let store = new_store().await;
				let user = random_store_id("user");
				let store_id = random_store_id("store");

				store
					.put(user.clone(), put_req(&store_id, None, vec![kv("k1", 0, "a"), kv("k2", 0, "b")]))
					.await
					.unwrap();

				// k2's version is stale (should be 1, we send 1 meaning "update from 1"),
				// so this whole batch must fail and leave both keys untouched.
				let err = store
					.put(
						user.clone(),
						put_req(&store_id, None, vec![kv("k1", 0, "a2"), kv("k2", 1, "b2")]),
					)
					.await
					.unwrap_err();
				assert!(matches!(err, $crate::error::VssError::ConflictError(_)));

				for (key, value) in [("k1", "a"), ("k2", "b")] {
					let got = store
						.get(user.clone(), GetObjectRequest { store_id: store_id.clone(), key: key.to_string() })
						.await
						.unwrap()
						.value
						.unwrap();
					assert_eq!(got.version, 1, "key {key} should not have advanced");
					assert_eq!(got.value, Bytes::from(value.as_bytes().to_vec()));
				}
			}

			// Scenario 4: unconditional upsert (version = -1) resets stored version to 1.
			#[tokio::test]
			#[ignore]
			async fn unconditional_upsert_resets_version() {
				let store = new_store().await;
				let user = random_store_id("user");
				let store_id = random_store_id("store");

				store.put(user.clone(), put_req(&store_id, None, vec![kv("k", 0, "v1")])).await.unwrap();
				store.put(user.clone(), put_req(&store_id, None, vec![kv("k", -1, "v2")])).await.unwrap();

				let got = store
					.get(user, GetObjectRequest { store_id, key: "k".to_string() })
					.await
					.unwrap()
					.value
					.unwrap();
				assert_eq!(got.version, 1);
				assert_eq!(got.value, Bytes::from_static(b"v2"));
			}

			// Scenario 6 / P5: get on a fresh store's reserved key returns the
			// synthetic default, and get on a truly missing key is NoSuchKeyError.
			#[tokio::test]
			#[ignore]
			async fn get_on_missing_reserved_key_returns_default() {
				let store = new_store().await;
				let user = random_store_id("user");
				let store_id = random_store_id("store");

				let global = store
					.get(user.clone(), GetObjectRequest { store_id: store_id.clone(), key: GLOBAL_VERSION_KEY.to_string() })
					.await
					.unwrap()
					.value
					.unwrap();
				assert_eq!(global.version, 0);
				assert!(global.value.is_empty());

				let err = store
					.get(user, GetObjectRequest { store_id, key: "missing".to_string() })
					.await
					.unwrap_err();
				assert!(matches!(err, $crate::error::VssError::NoSuchKeyError(_)));
			}

			// P5 / P7: listing never surfaces the reserved key, and paginating to
			// an empty page yields exactly the written key set.
			#[tokio::test]
			#[ignore]
			async fn listing_hides_reserved_key_and_is_complete() {
				let store = new_store().await;
				let user = random_store_id("user");
				let store_id = random_store_id("store");

				const N: i64 = 25;
				for i in 0..N {
					store
						.put(
							user.clone(),
							put_req(&store_id, Some(i), vec![kv(&format!("k{i}"), 0, "v")]),
						)
						.await
						.unwrap();
				}

				let mut seen = std::collections::HashSet::new();
				let mut page_token: Option<String> = None;
				let mut first_page_global_version = None;
				loop {
					let resp = store
						.list_key_versions(
							user.clone(),
							ListKeyVersionsRequest {
								store_id: store_id.clone(),
								key_prefix: None,
								page_size: Some(7),
								page_token: page_token.clone(),
							},
						)
						.await
						.unwrap();

					if page_token.is_none() {
						first_page_global_version = resp.global_version;
					} else {
						assert!(resp.global_version.is_none(), "global_version must be unset after page 1");
					}

					if resp.key_versions.is_empty() {
						assert_eq!(resp.next_page_token.as_deref(), Some(""));
						break;
					}
					for item in &resp.key_versions {
						assert_ne!(item.key, GLOBAL_VERSION_KEY);
						seen.insert(item.key.clone());
					}
					page_token = resp.next_page_token;
				}

				assert_eq!(seen.len(), N as usize);
				assert_eq!(first_page_global_version, Some(N));
			}

			// P6: two user_tokens never observe each other's data.
			#[tokio::test]
			#[ignore]
			async fn tenant_isolation() {
				let store = new_store().await;
				let user_a = random_store_id("user-a");
				let user_b = random_store_id("user-b");
				let store_id = random_store_id("store");

				store.put(user_a.clone(), put_req(&store_id, None, vec![kv("secret", 0, "a-only")])).await.unwrap();

				let err = store
					.get(user_b, GetObjectRequest { store_id, key: "secret".to_string() })
					.await
					.unwrap_err();
				assert!(matches!(err, $crate::error::VssError::NoSuchKeyError(_)));
			}

			// delete() honors the same version policy as a batched delete item.
			#[tokio::test]
			#[ignore]
			async fn delete_then_get_fails() {
				let store = new_store().await;
				let user = random_store_id("user");
				let store_id = random_store_id("store");

				store.put(user.clone(), put_req(&store_id, None, vec![kv("k", 0, "v")])).await.unwrap();
				store
					.delete(
						user.clone(),
						DeleteObjectRequest { store_id: store_id.clone(), key_value: Some(kv("k", 1, "")) },
					)
					.await
					.unwrap();

				let err = store
					.get(user, GetObjectRequest { store_id, key: "k".to_string() })
					.await
					.unwrap_err();
				assert!(matches!(err, $crate::error::VssError::NoSuchKeyError(_)));
			}

			// A conditional delete (version >= 0) against a stale version of an
			// existing key must conflict, not silently no-op, and must leave the
			// key untouched.
			#[tokio::test]
			#[ignore]
			async fn conditional_delete_with_stale_version_is_rejected() {
				let store = new_store().await;
				let user = random_store_id("user");
				let store_id = random_store_id("store");

				store.put(user.clone(), put_req(&store_id, None, vec![kv("k", 0, "v")])).await.unwrap();

				let err = store
					.delete(
						user.clone(),
						DeleteObjectRequest { store_id: store_id.clone(), key_value: Some(kv("k", 0, "")) },
					)
					.await
					.unwrap_err();
				assert!(matches!(err, $crate::error::VssError::ConflictError(_)));

				let got = store
					.get(user, GetObjectRequest { store_id, key: "k".to_string() })
					.await
					.unwrap()
					.value
					.unwrap();
				assert_eq!(got.version, 1, "key should not have been deleted");
			}

			// Unconditional delete on an absent key is a no-op success.
			#[tokio::test]
			#[ignore]
			async fn unconditional_delete_on_absent_key_succeeds() {
				let store = new_store().await;
				let user = random_store_id("user");
				let store_id = random_store_id("store");

				store
					.delete(
						user,
						DeleteObjectRequest { store_id, key_value: Some(kv("never-existed", -1, "")) },
					)
					.await
					.expect("unconditional delete of an absent key is a no-op success");
			}
		}
	};
}
