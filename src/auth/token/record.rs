//! Per-audience token records, lifecycle helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::token::{claims, secret::TokenSecret},
	error::MalformedError,
};

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// No access token is stored.
	Missing,
	/// Token is usable and outside the refresh margin (or its expiry is unknown).
	Active,
	/// Token expires within the refresh margin.
	Expiring,
	/// Token exceeded its expiry instant.
	Expired,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// A refresh token was provided without an access token.
	#[error("Access token is required when a refresh token is present.")]
	MissingAccessToken,
	/// A refresh token was provided without an expiry.
	#[error("Expiry is required when a refresh token is present.")]
	MissingExpiry,
}

/// Tokens held for one (user, audience) pair.
///
/// Every field is optional because the backing key-value store reports absent keys as empty.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Option<TokenSecret>,
	/// Refresh token secret.
	pub refresh_token: Option<TokenSecret>,
	/// Expiry decoded from the access token's `exp` claim.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenRecord {
	/// Returns a builder for constructing records.
	pub fn builder() -> TokenRecordBuilder {
		TokenRecordBuilder::default()
	}

	/// Builds a record from a freshly minted token pair, decoding the expiry from the access
	/// token itself.
	pub fn from_token_pair(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
	) -> Result<Self, MalformedError> {
		let access_token = access_token.into();
		let expires_at = claims::decode_expiry(&access_token)?;

		Ok(Self {
			access_token: Some(TokenSecret::new(access_token)),
			refresh_token: Some(TokenSecret::new(refresh_token)),
			expires_at: Some(expires_at),
		})
	}

	/// Computes the lifecycle status at `instant` given the refresh `margin`.
	pub fn status_at(&self, instant: OffsetDateTime, margin: Duration) -> TokenStatus {
		if self.access_token.is_none() {
			return TokenStatus::Missing;
		}

		match self.expires_at {
			Some(expires_at) if instant >= expires_at => TokenStatus::Expired,
			Some(expires_at) if expires_at - instant <= margin => TokenStatus::Expiring,
			_ => TokenStatus::Active,
		}
	}

	/// Returns `true` when a refresh must run before the token is used at `now`.
	///
	/// Requires both secrets and a known expiry; otherwise nothing can be refreshed.
	pub fn needs_refresh_at(&self, now: OffsetDateTime, margin: Duration) -> bool {
		self.refresh_token.is_some()
			&& matches!(self.status_at(now, margin), TokenStatus::Expiring | TokenStatus::Expired)
	}

	/// Returns `true` if neither secret is stored.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none() && self.refresh_token.is_none()
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug, Default)]
pub struct TokenRecordBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	expires_at: Option<OffsetDateTime>,
}
impl TokenRecordBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		if self.refresh_token.is_some() {
			if self.access_token.is_none() {
				return Err(TokenRecordBuilderError::MissingAccessToken);
			}
			if self.expires_at.is_none() {
				return Err(TokenRecordBuilderError::MissingExpiry);
			}
		}

		Ok(TokenRecord {
			access_token: self.access_token,
			refresh_token: self.refresh_token,
			expires_at: self.expires_at,
		})
	}
}
