//! Response and aggregate value types for the Trackmania services.
//!
//! Upstream documents carry many fields the client never interprets; those are preserved in each
//! type's `extra` map so callers still see the full payload.

// self
use crate::{
	_prelude::*,
	audience::Audience,
	auth::{AccountId, MapId, MapUid, TokenSecret},
};

/// Fields kept verbatim from upstream documents.
pub type Extra = BTreeMap<String, serde_json::Value>;

/// Group whose leaderboard holds personal bests.
pub const PERSONAL_BEST_GROUP: &str = "Personal_Best";

/// Map entry from the favorites endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteMap {
	/// Public map identifier.
	#[serde(rename = "uid")]
	pub map_uid: MapUid,
	/// Internal map identifier.
	pub map_id: MapId,
	/// Display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Author account identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub author: Option<String>,
	/// Remaining upstream fields.
	#[serde(flatten)]
	pub extra: Extra,
}

/// One page of favorites.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritePage {
	/// Total number of favorites across every page.
	pub item_count: usize,
	/// Maps on this page.
	#[serde(default)]
	pub map_list: Vec<FavoriteMap>,
}

/// Score fields of a personal record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordScore {
	/// Completion time in milliseconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub time: Option<i64>,
	/// Mode-specific score.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub score: Option<i64>,
	/// Respawns during the run.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub respawn_count: Option<i64>,
	/// Remaining upstream fields.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Personal record of one account on one map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEntry {
	/// Account owning the record.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub account_id: Option<AccountId>,
	/// Map the record was driven on.
	pub map_id: MapId,
	/// Score details.
	#[serde(default)]
	pub record_score: RecordScore,
	/// Remaining upstream fields.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Map metadata from the core map endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfo {
	/// Internal map identifier.
	pub map_id: MapId,
	/// Public map identifier.
	pub map_uid: MapUid,
	/// Display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Author account identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub author: Option<String>,
	/// Remaining upstream fields.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Position of a score inside one zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
	/// 1-based position.
	pub position: u64,
	/// Number of entries in the zone leaderboard.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub length: Option<u64>,
}

/// Ranking of a score in one geographic zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRanking {
	/// Zone identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub zone_id: Option<String>,
	/// Zone display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub zone_name: Option<String>,
	/// Position inside the zone.
	pub ranking: Ranking,
}

/// Leaderboard position of a score on one map, per zone (world first).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPosition {
	/// Map the position belongs to.
	pub map_uid: MapUid,
	/// Leaderboard group.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub group_uid: Option<String>,
	/// Score that was ranked.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub score: Option<i64>,
	/// Rankings ordered from the widest zone (world) to the narrowest.
	#[serde(default)]
	pub zones: Vec<ZoneRanking>,
}
impl LeaderboardPosition {
	/// World position, taken from the first zone.
	pub fn position(&self) -> Option<u64> {
		self.zones.first().map(|zone| zone.ranking.position)
	}
}

/// Entry of a leaderboard top page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEntry {
	/// Account holding the position.
	pub account_id: AccountId,
	/// 1-based position.
	pub position: u64,
	/// Ranked score.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub score: Option<i64>,
	/// Zone display name of the account.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub zone_name: Option<String>,
	/// Remaining upstream fields.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Top entries of one zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopZone {
	/// Zone identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub zone_id: Option<String>,
	/// Zone display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub zone_name: Option<String>,
	/// Entries of the page, ordered by position.
	#[serde(default)]
	pub top: Vec<TopEntry>,
}

/// One page of a map's leaderboard top.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardTop {
	/// One element per zone; world-only requests yield exactly one.
	#[serde(default)]
	pub tops: Vec<TopZone>,
}

/// Per-map view joining a personal record, map metadata, and a leaderboard position.
///
/// `M` is the metadata source: [`FavoriteMap`] for favorites, [`MapInfo`] for the full record
/// list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult<M> {
	/// Personal record, absent when the player never finished the map.
	pub record: Option<RecordEntry>,
	/// Map metadata, absent when the metadata lookup dropped the map.
	pub map_info: Option<M>,
	/// Leaderboard position of the record.
	pub record_position: Option<LeaderboardPosition>,
}
impl<M> AggregatedResult<M> {
	/// World position of the record, if known.
	pub fn position(&self) -> Option<u64> {
		self.record_position.as_ref().and_then(LeaderboardPosition::position)
	}
}

/// Identifier list selecting which maps [`crate::flows::TrackmaniaClient::get_map_info`] loads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapLookup {
	/// Look maps up by internal identifier.
	ByMapId(Vec<MapId>),
	/// Look maps up by public identifier.
	ByMapUid(Vec<MapUid>),
}
impl MapLookup {
	/// Query parameter carrying the identifier list.
	pub const fn param(&self) -> &'static str {
		match self {
			MapLookup::ByMapId(_) => "mapIdList",
			MapLookup::ByMapUid(_) => "mapUidList",
		}
	}

	/// Identifiers as plain strings, in input order.
	pub fn values(&self) -> Vec<String> {
		match self {
			MapLookup::ByMapId(ids) => ids.iter().map(ToString::to_string).collect(),
			MapLookup::ByMapUid(uids) => uids.iter().map(ToString::to_string).collect(),
		}
	}

	/// Returns `true` when the lookup names no map.
	pub fn is_empty(&self) -> bool {
		match self {
			MapLookup::ByMapId(ids) => ids.is_empty(),
			MapLookup::ByMapUid(uids) => uids.is_empty(),
		}
	}
}

/// Profile returned by the platform session endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformProfile {
	/// Session ticket exchanged for audience tokens.
	pub ticket: TokenSecret,
	/// Platform account identifier.
	pub user_id: AccountId,
	/// Display name on the platform.
	pub name_on_platform: String,
	/// Remaining upstream fields.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Token pair minted for one audience.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceTokens {
	/// Access token.
	pub access_token: TokenSecret,
	/// Refresh token.
	pub refresh_token: TokenSecret,
}

/// Result of the two-step login handshake.
///
/// Audience exchanges are independent: one audience failing leaves the others in `tokens`.
#[derive(Debug)]
pub struct LoginOutcome {
	/// Platform profile from the first step.
	pub profile: PlatformProfile,
	/// Tokens per audience that exchanged successfully.
	pub tokens: BTreeMap<Audience, AudienceTokens>,
	/// Failure per audience whose exchange did not succeed.
	pub failures: BTreeMap<Audience, Error>,
}
impl LoginOutcome {
	/// Returns `true` when every configured audience obtained tokens.
	pub fn is_complete(&self) -> bool {
		self.failures.is_empty()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn favorites_keep_unknown_fields() {
		let page: FavoritePage = serde_json::from_value(serde_json::json!({
			"itemCount": 1,
			"mapList": [{ "uid": "uid-1", "mapId": "id-1", "name": "A01", "collectionName": "Stadium" }]
		}))
		.expect("Favorites page should deserialize.");
		let map = &page.map_list[0];

		assert_eq!(page.item_count, 1);
		assert_eq!(&*map.map_uid, "uid-1");
		assert_eq!(map.extra.get("collectionName"), Some(&serde_json::json!("Stadium")));
	}

	#[test]
	fn positions_read_the_world_zone() {
		let position: LeaderboardPosition = serde_json::from_value(serde_json::json!({
			"groupUid": "Personal_Best",
			"mapUid": "uid-1",
			"score": 45_000,
			"zones": [
				{ "zoneId": "w", "zoneName": "World", "ranking": { "position": 1234, "length": 99 } },
				{ "zoneId": "e", "zoneName": "Europe", "ranking": { "position": 321, "length": 9 } }
			]
		}))
		.expect("Position should deserialize.");
		let aggregated = AggregatedResult::<MapInfo> {
			record: None,
			map_info: None,
			record_position: Some(position),
		};

		assert_eq!(aggregated.position(), Some(1234));

		let unranked = AggregatedResult::<MapInfo> { record_position: None, ..aggregated };

		assert_eq!(unranked.position(), None);
	}

	#[test]
	fn map_lookup_selects_parameter() {
		let ids = MapLookup::ByMapId(vec![MapId::new("a").expect("Map id should be valid.")]);

		assert_eq!(ids.param(), "mapIdList");
		assert_eq!(ids.values(), vec!["a".to_owned()]);
		assert_eq!(MapLookup::ByMapUid(Vec::new()).param(), "mapUidList");
		assert!(MapLookup::ByMapUid(Vec::new()).is_empty());
	}
}
