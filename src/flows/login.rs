//! Two-step login: platform session ticket, then one token exchange per audience.
//!
//! [`TrackmaniaClient::login`] only talks to the network; [`TrackmaniaClient::connect`] also
//! persists each minted pair plus the platform account id so later requests can find them.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::future;
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	audience::Audience,
	auth::{TokenRecord, TokenSecret, UserId},
	error::{AuthError, ConfigError, MalformedError},
	flows::{TrackmaniaClient, common},
	http::ApiHttpClient,
	model::{AudienceTokens, LoginOutcome, PlatformProfile},
	obs::{self, OpKind},
};

impl<C> TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	/// Logs in with platform credentials and mints tokens for every configured audience.
	///
	/// A rejected login fails the whole call. Audience exchanges run concurrently and fail
	/// independently; failed audiences are reported in [`LoginOutcome::failures`].
	pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
		obs::observe(OpKind::Login, "login", async move {
			let profile = self.open_session(username, password).await?;
			let ticket = &profile.ticket;
			let exchanges = self.config.audiences.iter().map(|&audience| async move {
				(audience, self.exchange_ticket_for_audience(ticket, audience).await)
			});
			let mut tokens = BTreeMap::new();
			let mut failures = BTreeMap::new();

			for (audience, result) in future::join_all(exchanges).await {
				match result {
					Ok(pair) => {
						tokens.insert(audience, pair);
					},
					Err(e) => {
						tracing::warn!(%audience, error = %e, "Audience token exchange failed.");

						failures.insert(audience, e);
					},
				}
			}

			Ok(LoginOutcome { profile, tokens, failures })
		})
		.await
	}

	/// Exchanges a platform ticket for the token pair of one audience.
	pub async fn exchange_ticket_for_audience(
		&self,
		ticket: &TokenSecret,
		audience: Audience,
	) -> Result<AudienceTokens> {
		const STAGE: &str = "token exchange";

		let body = serde_json::to_vec(&serde_json::json!({ "audience": audience.name() }))
			.map_err(ConfigError::Params)?;
		let request = common::json_request(
			Method::POST,
			&self.config.auth.token_exchange,
			&self.config.user_agent,
			&[common::authorization(ticket.authorization(common::UBI_SCHEME))],
			body,
		)?;
		let (status, response) =
			common::send(self, self.config.auth.token_exchange.as_str(), request).await?;

		if status >= 400 {
			return Err(AuthError::InvalidCredentials { stage: STAGE, status }.into());
		}

		let tokens: AudienceTokens = common::parse_json(STAGE, response.body())?;

		if tokens.access_token.expose().is_empty() {
			let missing = MalformedError::MissingField { context: STAGE, field: "accessToken" };

			return Err(missing.into());
		}

		Ok(tokens)
	}

	/// Logs in and persists every minted pair plus the account id for `user`.
	///
	/// Audiences whose access token carries no decodable expiry are moved to the failures.
	pub async fn connect(
		&self,
		user: &UserId,
		username: &str,
		password: &str,
	) -> Result<LoginOutcome> {
		let mut outcome = self.login(username, password).await?;
		let minted = std::mem::take(&mut outcome.tokens);

		for (audience, pair) in minted {
			let record = match TokenRecord::from_token_pair(
				pair.access_token.expose(),
				pair.refresh_token.expose(),
			) {
				Ok(record) => record,
				Err(e) => {
					tracing::warn!(%audience, error = %e, "Minted token has no usable expiry.");

					outcome.failures.insert(audience, e.into());

					continue;
				},
			};
			let guard = common::flow_guard(self, user, audience);
			let _singleflight = guard.lock().await;

			self.tokens.set(user, audience, &record).await?;
			self.tokens.set_account_id(user, audience, &outcome.profile.user_id).await?;

			tracing::info!(%user, %audience, "Stored audience tokens.");

			outcome.tokens.insert(audience, pair);
		}

		Ok(outcome)
	}

	/// Removes every stored token and account id of `user`.
	pub async fn disconnect(&self, user: &UserId) -> Result<()> {
		for audience in Audience::ALL {
			let guard = common::flow_guard(self, user, audience);
			let _singleflight = guard.lock().await;

			self.tokens.clear(user, audience).await?;
		}

		tracing::info!(%user, "Disconnected user.");

		Ok(())
	}

	async fn open_session(&self, username: &str, password: &str) -> Result<PlatformProfile> {
		const STAGE: &str = "login";

		let credentials = STANDARD.encode(format!("{username}:{password}"));
		let request = common::json_request(
			Method::POST,
			&self.config.auth.login,
			&self.config.user_agent,
			&[
				common::authorization(format!("Basic {credentials}")),
				(common::UBI_APP_ID_HEADER, self.config.ubi_app_id.clone()),
			],
			Vec::new(),
		)?;
		let (status, response) =
			common::send(self, self.config.auth.login.as_str(), request).await?;

		if status >= 400 {
			tracing::warn!(status, "Platform login rejected.");

			return Err(AuthError::InvalidCredentials { stage: STAGE, status }.into());
		}

		Ok(common::parse_json(STAGE, response.body())?)
	}
}

