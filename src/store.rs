//! Per-user key-value storage contracts and the token store built on top of them.

pub mod file;
pub mod memory;
pub mod tokens;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use tokens::TokenStore;

// self
use crate::{_prelude::*, auth::UserId};

/// Boxed future returned by [`UserConfigStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistent per-user configuration capability (opaque string values).
///
/// Hosts plug their own settings storage in here; the crate ships [`MemoryStore`] and
/// [`FileStore`].
pub trait UserConfigStore
where
	Self: Send + Sync,
{
	/// Reads a value, returning `None` when the key was never written.
	fn get_value<'a>(
		&'a self,
		user: &'a UserId,
		namespace: &'a str,
		key: &'a str,
	) -> StoreFuture<'a, Option<String>>;

	/// Writes every entry in one step; readers never observe a partial batch.
	fn set_values<'a>(
		&'a self,
		user: &'a UserId,
		namespace: &'a str,
		entries: Vec<(String, String)>,
	) -> StoreFuture<'a, ()>;

	/// Removes the provided keys; missing keys are ignored.
	fn delete_values<'a>(
		&'a self,
		user: &'a UserId,
		namespace: &'a str,
		keys: Vec<String>,
	) -> StoreFuture<'a, ()>;

	/// Writes a single value.
	fn set_value<'a>(
		&'a self,
		user: &'a UserId,
		namespace: &'a str,
		key: &'a str,
		value: String,
	) -> StoreFuture<'a, ()> {
		self.set_values(user, namespace, vec![(key.to_owned(), value)])
	}
}

/// Error type produced by [`UserConfigStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A stored value cannot be interpreted.
	#[error("Stored value for `{key}` is invalid: {message}.")]
	InvalidValue {
		/// Key holding the value.
		key: String,
		/// Human-readable error payload.
		message: String,
	},
}

/// Unique key identifying a stored value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
	/// Owning user.
	pub user: UserId,
	/// Application namespace.
	pub namespace: String,
	/// Key within the namespace.
	pub key: String,
}
impl ConfigKey {
	/// Builds a key from its components.
	pub fn new(user: &UserId, namespace: &str, key: &str) -> Self {
		Self { user: user.clone(), namespace: namespace.to_owned(), key: key.to_owned() }
	}
}
