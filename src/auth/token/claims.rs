//! Unverified access token claim decoding.
//!
//! Nadeo access tokens are JWTs. The broker never validates their signature (the services do);
//! it only reads the payload to learn when the token expires.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, error::MalformedError};

/// Subset of access token claims the broker relies on.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AccessClaims {
	/// Expiry as a unix timestamp (seconds).
	pub exp: i64,
	/// Audience the token was minted for, when present.
	#[serde(default)]
	pub aud: Option<String>,
	/// Subject (account identifier), when present.
	#[serde(default)]
	pub sub: Option<String>,
}
impl AccessClaims {
	/// Decodes the payload segment of `token`.
	pub fn decode(token: &str) -> Result<Self, MalformedError> {
		let mut segments = token.split('.');
		let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
			(Some(_), Some(payload), Some(_), None) => payload,
			_ => return Err(invalid("token is not made of three segments")),
		};
		let bytes = URL_SAFE_NO_PAD
			.decode(payload.trim_end_matches('='))
			.map_err(|e| invalid(format!("payload is not base64url: {e}")))?;

		serde_json::from_slice(&bytes).map_err(|e| invalid(format!("payload is not JSON: {e}")))
	}

	/// Expiry as an [`OffsetDateTime`].
	pub fn expires_at(&self) -> Result<OffsetDateTime, MalformedError> {
		OffsetDateTime::from_unix_timestamp(self.exp)
			.map_err(|e| invalid(format!("exp claim is out of range: {e}")))
	}
}

/// Shortcut decoding only the expiry instant of `token`.
pub fn decode_expiry(token: &str) -> Result<OffsetDateTime, MalformedError> {
	AccessClaims::decode(token)?.expires_at()
}

fn invalid(reason: impl Into<String>) -> MalformedError {
	MalformedError::InvalidTokenClaims { reason: reason.into() }
}
