//! Strongly typed identifiers for users, accounts, and maps.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (user, account, map).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (user, account, map).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (user, account, map).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { UserId, "Host-side user whose tokens and settings are stored.", "User" }
def_id! { AccountId, "Player account identifier on the game platform.", "Account" }
def_id! { MapId, "Opaque internal map identifier used by the core services.", "MapId" }
def_id! { MapUid, "Public map identifier used by favorites and leaderboards.", "MapUid" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_blank_and_spaced_values() {
		assert!(UserId::new("").is_err());
		assert!(MapUid::new(" uid").is_err());
		assert!(MapId::new("map id").is_err());

		let account = AccountId::new("0f8b2c4e-1f3a-4d5e-9a8b-7c6d5e4f3a2b")
			.expect("Account fixture should be valid.");

		assert_eq!(account.len(), 36);
		assert_eq!(format!("{account:?}"), "Account(0f8b2c4e-1f3a-4d5e-9a8b-7c6d5e4f3a2b)");
	}

	#[test]
	fn serde_enforces_validation() {
		let uid: MapUid =
			serde_json::from_str("\"olsKnq_qAghcVAnEkoeUnVHFZei\"").expect("Uid should parse.");

		assert_eq!(uid.as_ref(), "olsKnq_qAghcVAnEkoeUnVHFZei");
		assert!(serde_json::from_str::<MapUid>("\"\"").is_err());
		assert!(serde_json::from_str::<MapId>(&format!("\"{}\"", "a".repeat(129))).is_err());
	}

	#[test]
	fn borrow_supports_str_lookup() {
		let map: HashMap<MapUid, u8> =
			HashMap::from_iter([(MapUid::new("uid-1").expect("Uid should be valid."), 3_u8)]);

		assert_eq!(map.get("uid-1"), Some(&3));
	}
}
