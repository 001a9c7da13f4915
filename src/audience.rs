//! Statically configured token audiences.

// self
use crate::_prelude::*;

/// Independent token scope issued by the Nadeo authentication service.
///
/// Each audience owns its own access/refresh token pair, a default base URL for the data
/// endpoints it unlocks, and a storage prefix under which its tokens are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Audience {
	/// Core services (map metadata, map records).
	#[serde(rename = "NadeoServices")]
	Core,
	/// Live services (favorites, leaderboards).
	#[serde(rename = "NadeoLiveServices")]
	Live,
}
impl Audience {
	/// Every audience minted during login, in exchange order.
	pub const ALL: [Audience; 2] = [Audience::Core, Audience::Live];

	/// Audience name sent to the token exchange endpoint.
	pub const fn name(self) -> &'static str {
		match self {
			Audience::Core => "NadeoServices",
			Audience::Live => "NadeoLiveServices",
		}
	}

	/// Prefix prepended to every storage key of this audience.
	pub const fn storage_prefix(self) -> &'static str {
		match self {
			Audience::Core => "core_",
			Audience::Live => "live_",
		}
	}

	/// Production base URL for the audience's data endpoints.
	pub const fn default_base_url(self) -> &'static str {
		match self {
			Audience::Core => "https://prod.trackmania.core.nadeo.online/",
			Audience::Live => "https://live-services.trackmania.nadeo.live/api/token/",
		}
	}
}
impl Display for Audience {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.name())
	}
}
impl FromStr for Audience {
	type Err = UnknownAudience;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|audience| audience.name() == s)
			.ok_or_else(|| UnknownAudience(s.to_owned()))
	}
}

/// Error returned when parsing an audience name that is not configured.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown audience `{0}`.")]
pub struct UnknownAudience(pub String);
