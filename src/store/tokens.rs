//! Per-(user, audience) token persistence over a [`UserConfigStore`].

// self
use crate::{
	_prelude::*,
	audience::Audience,
	auth::{AccountId, TokenRecord, TokenSecret, UserId},
	store::{StoreError, UserConfigStore},
};

const TOKEN_KEY: &str = "token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const EXPIRES_AT_KEY: &str = "token_expires_at";
const ACCOUNT_ID_KEY: &str = "account_id";

/// Reads and writes [`TokenRecord`]s under `<prefix>token`, `<prefix>refresh_token`, and
/// `<prefix>token_expires_at` (unix seconds), plus the account id under `<prefix>account_id`.
#[derive(Clone)]
pub struct TokenStore {
	backend: Arc<dyn UserConfigStore>,
	namespace: String,
}
impl TokenStore {
	/// Namespace used when none is configured.
	pub const DEFAULT_NAMESPACE: &'static str = "trackmania";

	/// Wraps a backend using [`Self::DEFAULT_NAMESPACE`].
	pub fn new(backend: Arc<dyn UserConfigStore>) -> Self {
		Self::with_namespace(backend, Self::DEFAULT_NAMESPACE)
	}

	/// Wraps a backend using a custom namespace.
	pub fn with_namespace(backend: Arc<dyn UserConfigStore>, namespace: impl Into<String>) -> Self {
		Self { backend, namespace: namespace.into() }
	}

	/// Namespace the values live under.
	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Loads the record for `(user, audience)`; absent keys yield empty fields.
	pub async fn get(&self, user: &UserId, audience: Audience) -> Result<TokenRecord, StoreError> {
		let access = self.read(user, audience, TOKEN_KEY).await?;
		let refresh = self.read(user, audience, REFRESH_TOKEN_KEY).await?;
		let expires_at = match self.read(user, audience, EXPIRES_AT_KEY).await? {
			Some(raw) => Some(parse_timestamp(&key(audience, EXPIRES_AT_KEY), &raw)?),
			None => None,
		};

		Ok(TokenRecord {
			access_token: TokenSecret::from_stored(access),
			refresh_token: TokenSecret::from_stored(refresh),
			expires_at,
		})
	}

	/// Replaces all three token fields in one backend write.
	pub async fn set(
		&self,
		user: &UserId,
		audience: Audience,
		record: &TokenRecord,
	) -> Result<(), StoreError> {
		let secret = |s: &Option<TokenSecret>| {
			s.as_ref().map(|s| s.expose().to_owned()).unwrap_or_default()
		};
		let entries = vec![
			(key(audience, TOKEN_KEY), secret(&record.access_token)),
			(key(audience, REFRESH_TOKEN_KEY), secret(&record.refresh_token)),
			(
				key(audience, EXPIRES_AT_KEY),
				record.expires_at.map(|at| at.unix_timestamp().to_string()).unwrap_or_default(),
			),
		];

		self.backend.set_values(user, &self.namespace, entries).await
	}

	/// Reads the platform account id stored for `(user, audience)`.
	pub async fn account_id(
		&self,
		user: &UserId,
		audience: Audience,
	) -> Result<Option<AccountId>, StoreError> {
		match self.read(user, audience, ACCOUNT_ID_KEY).await? {
			Some(raw) => AccountId::new(&raw).map(Some).map_err(|e| StoreError::InvalidValue {
				key: key(audience, ACCOUNT_ID_KEY),
				message: e.to_string(),
			}),
			None => Ok(None),
		}
	}

	/// Stores the platform account id for `(user, audience)`.
	pub async fn set_account_id(
		&self,
		user: &UserId,
		audience: Audience,
		account_id: &AccountId,
	) -> Result<(), StoreError> {
		self.backend
			.set_value(
				user,
				&self.namespace,
				&key(audience, ACCOUNT_ID_KEY),
				account_id.to_string(),
			)
			.await
	}

	/// Removes every value stored for `(user, audience)`.
	pub async fn clear(&self, user: &UserId, audience: Audience) -> Result<(), StoreError> {
		let keys = [TOKEN_KEY, REFRESH_TOKEN_KEY, EXPIRES_AT_KEY, ACCOUNT_ID_KEY]
			.into_iter()
			.map(|suffix| key(audience, suffix))
			.collect();

		self.backend.delete_values(user, &self.namespace, keys).await
	}

	async fn read(
		&self,
		user: &UserId,
		audience: Audience,
		suffix: &str,
	) -> Result<Option<String>, StoreError> {
		let value = self.backend.get_value(user, &self.namespace, &key(audience, suffix)).await?;

		Ok(value.filter(|v| !v.is_empty()))
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore").field("namespace", &self.namespace).finish()
	}
}

fn key(audience: Audience, suffix: &str) -> String {
	format!("{}{suffix}", audience.storage_prefix())
}

fn parse_timestamp(key: &str, raw: &str) -> Result<OffsetDateTime, StoreError> {
	raw.trim()
		.parse::<i64>()
		.ok()
		.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
		.ok_or_else(|| StoreError::InvalidValue {
			key: key.to_owned(),
			message: format!("`{raw}` is not a unix timestamp"),
		})
}
