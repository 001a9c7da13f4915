//! Thread-safe in-memory [`UserConfigStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::UserId,
	store::{ConfigKey, StoreError, StoreFuture, UserConfigStore},
};

type StoreMap = Arc<RwLock<HashMap<ConfigKey, String>>>;

/// Thread-safe storage backend that keeps values in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored values across every user.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: StoreMap, key: ConfigKey) -> Option<String> {
		map.read().get(&key).cloned()
	}

	fn set_now(
		map: StoreMap,
		user: UserId,
		namespace: String,
		entries: Vec<(String, String)>,
	) -> Result<(), StoreError> {
		let mut guard = map.write();

		for (key, value) in entries {
			guard.insert(ConfigKey::new(&user, &namespace, &key), value);
		}

		Ok(())
	}

	fn delete_now(map: StoreMap, user: UserId, namespace: String, keys: Vec<String>) {
		let mut guard = map.write();

		for key in keys {
			guard.remove(&ConfigKey::new(&user, &namespace, &key));
		}
	}
}
impl UserConfigStore for MemoryStore {
	fn get_value<'a>(
		&'a self,
		user: &'a UserId,
		namespace: &'a str,
		key: &'a str,
	) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();
		let key = ConfigKey::new(user, namespace, key);

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn set_values<'a>(
		&'a self,
		user: &'a UserId,
		namespace: &'a str,
		entries: Vec<(String, String)>,
	) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let user = user.to_owned();
		let namespace = namespace.to_owned();

		Box::pin(async move { Self::set_now(map, user, namespace, entries) })
	}

	fn delete_values<'a>(
		&'a self,
		user: &'a UserId,
		namespace: &'a str,
		keys: Vec<String>,
	) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let user = user.to_owned();
		let namespace = namespace.to_owned();

		Box::pin(async move {
			Self::delete_now(map, user, namespace, keys);

			Ok(())
		})
	}
}
