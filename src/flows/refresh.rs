//! Refresh handshake and the pre-request freshness check.
//!
//! Both entry points serialize on the per-(user, audience) guard, so concurrent requests for the
//! same pair trigger at most one refresh. A failed refresh never touches the stored record.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	audience::Audience,
	auth::{TokenRecord, UserId},
	error::{AuthError, MalformedError},
	flows::{TrackmaniaClient, common},
	http::ApiHttpClient,
	model::AudienceTokens,
	obs::{self, OpKind},
};

impl<C> TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	/// Exchanges the stored refresh token of `(user, audience)` for a new pair.
	///
	/// Fails fast without any request when no refresh token is stored. On success the new access
	/// token, refresh token, and decoded expiry are written in one store call and returned.
	pub async fn refresh(&self, user: &UserId, audience: Audience) -> Result<TokenRecord> {
		let guard = common::flow_guard(self, user, audience);
		let _singleflight = guard.lock().await;

		self.refresh_locked(user, audience).await
	}

	/// Returns the stored record of `(user, audience)`, refreshing it first when it expires
	/// within the configured margin.
	///
	/// Refresh failures are logged and the stale record is returned; only storage failures
	/// propagate.
	pub async fn ensure_fresh(&self, user: &UserId, audience: Audience) -> Result<TokenRecord> {
		let guard = common::flow_guard(self, user, audience);
		let _singleflight = guard.lock().await;
		let record = self.tokens.get(user, audience).await?;
		let now = OffsetDateTime::now_utc();

		if !record.needs_refresh_at(now, self.config.limits.refresh_margin()) {
			return Ok(record);
		}

		tracing::debug!(%user, %audience, expires_at = ?record.expires_at, "Refreshing token.");

		match self.refresh_locked(user, audience).await {
			Ok(fresh) => Ok(fresh),
			Err(e) => {
				tracing::warn!(%user, %audience, error = %e, "Refresh failed; using stale token.");

				Ok(record)
			},
		}
	}

	async fn refresh_locked(&self, user: &UserId, audience: Audience) -> Result<TokenRecord> {
		obs::observe(OpKind::Refresh, "refresh", async move {
			self.refresh_metrics.record_attempt();

			let result = self.exchange_refresh_token(user, audience).await;

			self.refresh_metrics.record_outcome(&result);

			result
		})
		.await
	}

	async fn exchange_refresh_token(
		&self,
		user: &UserId,
		audience: Audience,
	) -> Result<TokenRecord> {
		const STAGE: &str = "refresh";

		let current = self.tokens.get(user, audience).await?;
		let refresh_token =
			current.refresh_token.ok_or(AuthError::MissingRefreshToken { audience })?;
		let request = common::json_request(
			Method::POST,
			&self.config.auth.refresh,
			&self.config.user_agent,
			&[common::authorization(refresh_token.authorization(common::NADEO_SCHEME))],
			Vec::new(),
		)?;
		let (status, response) =
			common::send(self, self.config.auth.refresh.as_str(), request).await?;

		if status >= 400 {
			return Err(AuthError::RefreshRejected { audience, status }.into());
		}

		let pair: AudienceTokens = common::parse_json(STAGE, response.body())?;

		if pair.access_token.expose().is_empty() {
			let missing = MalformedError::MissingField { context: STAGE, field: "accessToken" };

			return Err(missing.into());
		}

		let record =
			TokenRecord::from_token_pair(pair.access_token.expose(), pair.refresh_token.expose())?;

		self.tokens.set(user, audience, &record).await?;

		tracing::info!(%user, %audience, expires_at = ?record.expires_at, "Token refreshed.");

		Ok(record)
	}
}
