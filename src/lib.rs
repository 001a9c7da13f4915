//! Token lifecycle broker and batched request orchestrator for the Trackmania (Nadeo) services.
//!
//! The crate logs a player in once, mints tokens for every configured [`audience::Audience`],
//! keeps them fresh before each call, and fans large identifier lists out into URL-bounded
//! requests whose results are joined into per-map views (favorites, personal bests, and
//! leaderboard positions).

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod audience;
pub mod auth;
pub mod chunk;
pub mod config;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod http;
pub mod model;
pub mod obs;
pub mod services;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		auth::UserId,
		config::{ClientConfig, ClientConfigBuilder},
		flows::TrackmaniaClient,
		http::ReqwestHttpClient,
		store::{MemoryStore, TokenStore, UserConfigStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = TrackmaniaClient<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Returns a configuration builder whose every endpoint points at `base` (a mock server).
	///
	/// Core services live under `<base>/core/`, live services under `<base>/live/`, and the
	/// handshake endpoints under `<base>/auth/`.
	pub fn test_config_builder(base: &str) -> ClientConfigBuilder {
		let base = base.trim_end_matches('/');
		let url = |path: &str| {
			Url::parse(&format!("{base}{path}")).expect("Failed to parse mock endpoint URL.")
		};

		ClientConfig::builder()
			.login_url(url("/auth/sessions"))
			.token_exchange_url(url("/auth/token/ubiservices"))
			.refresh_url(url("/auth/token/refresh"))
			.audience_base_url(crate::audience::Audience::Core, url("/core/"))
			.audience_base_url(crate::audience::Audience::Live, url("/live/"))
	}

	/// Constructs a client backed by an in-memory store and the reqwest transport used across
	/// integration tests.
	pub fn build_reqwest_test_client(
		config: ClientConfig,
	) -> (ReqwestTestClient, Arc<MemoryStore>) {
		let backend = Arc::new(MemoryStore::default());
		let dyn_backend: Arc<dyn UserConfigStore> = backend.clone();
		let tokens = TokenStore::new(dyn_backend);
		let client = TrackmaniaClient::with_http_client(tokens, config, test_reqwest_http_client());

		(client, backend)
	}

	/// Builds an unsigned JWT-shaped token whose payload carries the provided `exp` claim.
	pub fn fake_jwt(exp: i64) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
		let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp},\"aud\":\"test\"}}"));

		format!("{header}.{payload}.signature")
	}

	/// Returns a validated user identifier fixture.
	pub fn test_user(value: &str) -> UserId {
		UserId::new(value).expect("User fixture should be valid.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))]
use {color_eyre as _, httpmock as _, tokio as _, tracing_subscriber as _};
