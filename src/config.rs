//! Client configuration: handshake endpoints, audience base URLs, and orchestration limits.
//!
//! Defaults target the production Ubisoft/Nadeo services. Every URL can be overridden (local
//! mocks, proxies) through [`ClientConfigBuilder`], which validates the result.

/// Builder API for assembling client configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, audience::Audience};

/// Product user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str =
	concat!("trackmania-broker/", env!("CARGO_PKG_VERSION"), " (token broker; self-hosted)");
/// Application id presented to the Ubisoft session endpoint.
pub const DEFAULT_UBI_APP_ID: &str = "86263886-327a-4328-ac69-527f0d20a237";

/// Handshake endpoints used by the login and refresh flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEndpoints {
	/// Credential exchange (Basic auth) returning a platform ticket.
	pub login: Url,
	/// Ticket → per-audience token exchange.
	pub token_exchange: Url,
	/// Refresh token exchange.
	pub refresh: Url,
}
impl Default for AuthEndpoints {
	fn default() -> Self {
		Self {
			login: static_url("https://public-ubiservices.ubi.com/v3/profiles/sessions"),
			token_exchange: static_url(
				"https://prod.trackmania.core.nadeo.online/v2/authentication/token/ubiservices",
			),
			refresh: static_url(
				"https://prod.trackmania.core.nadeo.online/v2/authentication/token/refresh",
			),
		}
	}
}

/// Sizes, margins, and caps that drive the orchestration layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
	/// Seconds before expiry at which a token is refreshed pre-emptively.
	pub refresh_margin_secs: i64,
	/// Budget (characters) for identifier lists sent in one query string.
	pub chunk_budget: usize,
	/// Page size for favorites pagination.
	pub favorites_page_size: usize,
	/// Maps per leaderboard position batch.
	pub score_batch_size: usize,
	/// Page size for the leaderboard top scan.
	pub top_page_size: usize,
	/// Maximum number of pages read by the leaderboard top scan.
	pub top_scan_max_pages: usize,
	/// Retries granted to a failing pagination page before giving up.
	pub max_page_retries: usize,
	/// Chunk or batch requests allowed in flight at once.
	pub max_concurrency: usize,
}
impl Limits {
	/// Refresh margin as a [`Duration`].
	pub fn refresh_margin(&self) -> Duration {
		Duration::seconds(self.refresh_margin_secs)
	}
}
impl Default for Limits {
	fn default() -> Self {
		Self {
			refresh_margin_secs: 60,
			// Keeps the encoded list well under the 8220-character URI ceiling.
			chunk_budget: 7_000,
			favorites_page_size: 200,
			score_batch_size: 50,
			top_page_size: 100,
			top_scan_max_pages: 100,
			max_page_retries: 2,
			max_concurrency: 4,
		}
	}
}

/// Immutable configuration consumed by [`crate::flows::TrackmaniaClient`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Handshake endpoints.
	pub auth: AuthEndpoints,
	/// Base URL per audience; missing audiences fall back to their production URL.
	pub audience_base_urls: BTreeMap<Audience, Url>,
	/// Audiences minted during login.
	pub audiences: Vec<Audience>,
	/// User agent sent with every request.
	pub user_agent: String,
	/// Application id sent to the login endpoint.
	pub ubi_app_id: String,
	/// Orchestration limits.
	pub limits: Limits,
}
impl ClientConfig {
	/// Creates a new builder seeded with production defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::new()
	}

	/// Base URL for the audience's data endpoints.
	pub fn base_url(&self, audience: Audience) -> Url {
		self.audience_base_urls
			.get(&audience)
			.cloned()
			.unwrap_or_else(|| static_url(audience.default_base_url()))
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			auth: AuthEndpoints::default(),
			audience_base_urls: Audience::ALL
				.into_iter()
				.map(|audience| (audience, static_url(audience.default_base_url())))
				.collect(),
			audiences: Audience::ALL.to_vec(),
			user_agent: DEFAULT_USER_AGENT.into(),
			ubi_app_id: DEFAULT_UBI_APP_ID.into(),
			limits: Limits::default(),
		}
	}
}

fn static_url(value: &'static str) -> Url {
	Url::parse(value).unwrap_or_else(|e| panic!("built-in URL `{value}` is invalid: {e}"))
}
