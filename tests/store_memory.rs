// crates.io
use futures::future;
// self
use trackmania_broker::{
	_preludet::*,
	audience::Audience,
	auth::TokenRecord,
	store::{MemoryStore, TokenStore, UserConfigStore},
};

const NAMESPACE: &str = "trackmania";

#[tokio::test]
async fn users_and_namespaces_are_isolated() {
	let store = MemoryStore::default();
	let alice = test_user("alice");
	let bob = test_user("bob");

	store
		.set_value(&alice, NAMESPACE, "core_token", "alice-token".into())
		.await
		.expect("Writing into the memory store should succeed.");
	store
		.set_value(&alice, "other", "core_token", "other-token".into())
		.await
		.expect("Writing into the memory store should succeed.");

	assert_eq!(
		store.get_value(&alice, NAMESPACE, "core_token").await.expect("Read should succeed."),
		Some("alice-token".into())
	);
	assert_eq!(
		store.get_value(&bob, NAMESPACE, "core_token").await.expect("Read should succeed."),
		None
	);
	assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn deleting_missing_keys_is_a_no_op() {
	let store = MemoryStore::default();
	let user = test_user("alice");

	store
		.set_values(&user, NAMESPACE, vec![("a".into(), "1".into()), ("b".into(), "2".into())])
		.await
		.expect("Batch write should succeed.");
	store
		.delete_values(&user, NAMESPACE, vec!["a".into(), "missing".into()])
		.await
		.expect("Deleting absent keys should succeed.");

	assert_eq!(store.get_value(&user, NAMESPACE, "a").await.expect("Read should succeed."), None);
	assert_eq!(
		store.get_value(&user, NAMESPACE, "b").await.expect("Read should succeed."),
		Some("2".into())
	);
}

#[tokio::test]
async fn concurrent_writers_never_tear_a_record() {
	let backend = Arc::new(MemoryStore::default());
	let tokens = TokenStore::new(backend.clone());
	let user = test_user("alice");
	let expires_at = OffsetDateTime::from_unix_timestamp(1_900_000_000)
		.expect("Expiry fixture should be valid.");
	let records = (0..16)
		.map(|i| {
			TokenRecord::builder()
				.access_token(format!("access-{i}"))
				.refresh_token(format!("refresh-{i}"))
				.expires_at(expires_at + Duration::seconds(i))
				.build()
				.expect("Token record fixture should build successfully.")
		})
		.collect::<Vec<_>>();
	let writes = records.iter().map(|record| tokens.set(&user, Audience::Live, record));

	for result in future::join_all(writes).await {
		result.expect("Concurrent writes should succeed.");
	}

	let stored = tokens.get(&user, Audience::Live).await.expect("Stored record should load.");

	assert!(records.contains(&stored));
}
