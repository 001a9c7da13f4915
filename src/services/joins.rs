//! Per-map joins of favorites or records with map metadata and leaderboard positions.

// std
use std::collections::HashSet;
// self
use crate::{
	_prelude::*,
	auth::{MapId, MapUid, UserId},
	flows::TrackmaniaClient,
	http::ApiHttpClient,
	model::{AggregatedResult, FavoriteMap, LeaderboardPosition, MapInfo, MapLookup, RecordEntry},
	obs::{self, OpKind},
};

type Positions = HashMap<MapUid, LeaderboardPosition>;

impl<C> TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	/// Joins every favorite map with the user's record on it and that record's position.
	///
	/// One result per favorite, in favorites order. Favorites without a timed record carry no
	/// position.
	pub async fn get_favorites_with_position(
		&self,
		user: &UserId,
	) -> Result<Vec<AggregatedResult<FavoriteMap>>> {
		obs::observe(OpKind::Aggregate, "get_favorites_with_position", async move {
			let favorites = self.get_all_favorites(user).await?;
			let records = self.get_map_records(user, None, None).await?;
			let by_map_id = index_records(&records);
			let scores = favorites
				.iter()
				.filter_map(|favorite| {
					let time = by_map_id.get(&favorite.map_id)?.record_score.time?;

					Some((favorite.map_uid.clone(), time))
				})
				.collect::<BTreeMap<_, _>>();
			let positions = self.get_score_positions(user, &scores).await?;

			Ok(join_favorites(favorites, &by_map_id, &scores, &positions))
		})
		.await
	}

	/// Joins every record of the user with its map metadata and leaderboard position.
	///
	/// One result per record, in record order. Records whose map metadata could not be loaded
	/// carry neither metadata nor position.
	pub async fn get_all_maps_with_position(
		&self,
		user: &UserId,
	) -> Result<Vec<AggregatedResult<MapInfo>>> {
		obs::observe(OpKind::Aggregate, "get_all_maps_with_position", async move {
			let records = self.get_map_records(user, None, None).await?;
			let mut seen = HashSet::new();
			let map_ids = records
				.iter()
				.filter(|record| seen.insert(&record.map_id))
				.map(|record| record.map_id.clone())
				.collect::<Vec<_>>();
			let infos = self.get_map_info(user, &MapLookup::ByMapId(map_ids)).await?;
			let by_map_id = index_records(&records);
			let scores = infos
				.iter()
				.filter_map(|info| {
					let time = by_map_id.get(&info.map_id)?.record_score.time?;

					Some((info.map_uid.clone(), time))
				})
				.collect::<BTreeMap<_, _>>();
			let positions = self.get_score_positions(user, &scores).await?;

			Ok(join_records(&records, &infos, &scores, &positions))
		})
		.await
	}
}

fn index_records(records: &[RecordEntry]) -> HashMap<&MapId, &RecordEntry> {
	records.iter().map(|record| (&record.map_id, record)).collect()
}

fn position_for(
	map_uid: &MapUid,
	scores: &BTreeMap<MapUid, i64>,
	positions: &Positions,
) -> Option<LeaderboardPosition> {
	if scores.contains_key(map_uid) { positions.get(map_uid).cloned() } else { None }
}

fn join_favorites(
	favorites: Vec<FavoriteMap>,
	records: &HashMap<&MapId, &RecordEntry>,
	scores: &BTreeMap<MapUid, i64>,
	positions: &Positions,
) -> Vec<AggregatedResult<FavoriteMap>> {
	favorites
		.into_iter()
		.map(|favorite| AggregatedResult {
			record: records.get(&favorite.map_id).map(|record| (*record).clone()),
			record_position: position_for(&favorite.map_uid, scores, positions),
			map_info: Some(favorite),
		})
		.collect()
}

fn join_records(
	records: &[RecordEntry],
	infos: &[MapInfo],
	scores: &BTreeMap<MapUid, i64>,
	positions: &Positions,
) -> Vec<AggregatedResult<MapInfo>> {
	let infos = infos.iter().map(|info| (&info.map_id, info)).collect::<HashMap<_, _>>();

	records
		.iter()
		.map(|record| {
			let info = infos.get(&record.map_id).copied();

			AggregatedResult {
				record: Some(record.clone()),
				record_position: info
					.and_then(|info| position_for(&info.map_uid, scores, positions)),
				map_info: info.cloned(),
			}
		})
		.collect()
}
