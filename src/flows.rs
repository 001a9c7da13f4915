//! Client value and the token handshakes (login, audience exchange, refresh).

pub mod common;
pub mod login;
pub mod refresh;

pub use refresh::*;

// self
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};
use crate::{
	_prelude::*,
	audience::Audience,
	auth::UserId,
	config::ClientConfig,
	http::ApiHttpClient,
	store::TokenStore,
};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestTrackmaniaClient = TrackmaniaClient<ReqwestHttpClient>;

/// Coordinates the token lifecycle and every data request for a set of users.
///
/// The client owns the HTTP client, token store, configuration, and refresh bookkeeping so the
/// gateway and services only deal with request shapes. Cloning is cheap and clones share the
/// per-(user, audience) refresh guards.
#[derive(Clone)]
pub struct TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Token persistence keyed by (user, audience).
	pub tokens: TokenStore,
	/// Endpoints and orchestration limits.
	pub config: Arc<ClientConfig>,
	/// Shared metrics recorder for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	flow_guards: Arc<Mutex<HashMap<(UserId, Audience), Arc<AsyncMutex<()>>>>>,
}
impl<C> TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(
		tokens: TokenStore,
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			tokens,
			config: Arc::new(config),
			refresh_metrics: Default::default(),
			flow_guards: Default::default(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl TrackmaniaClient<ReqwestHttpClient> {
	/// Creates a client with its own reqwest transport.
	///
	/// The transport carries the configured user agent so every request identifies the product.
	pub fn new(tokens: TokenStore, config: ClientConfig) -> Result<Self> {
		config.validate().map_err(ConfigError::from)?;

		let client = ReqwestClient::builder()
			.user_agent(config.user_agent.clone())
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self::with_http_client(tokens, config, ReqwestHttpClient::with_client(client)))
	}
}
impl<C> Debug for TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TrackmaniaClient")
			.field("tokens", &self.tokens)
			.field("config", &self.config)
			.finish()
	}
}
