//! Token secret wrapper that keeps sensitive material out of logs.

// self
use crate::_prelude::*;

/// Redacted token secret; `Debug` and `Display` never print the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Wraps a stored value, treating the empty string as "absent".
	pub fn from_stored(value: Option<String>) -> Option<Self> {
		value.filter(|v| !v.is_empty()).map(Self)
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the value for the `Authorization` header using the given scheme
	/// (`nadeo_v1`, `ubi_v1`).
	pub fn authorization(&self, scheme: &str) -> String {
		format!("{scheme} t={}", self.0)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
