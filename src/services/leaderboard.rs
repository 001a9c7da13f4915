//! Live-audience leaderboard lookups: score positions and the map top scan.

// self
use crate::{
	_prelude::*,
	audience::Audience,
	auth::{AccountId, MapUid, UserId},
	chunk,
	error::AuthError,
	flows::TrackmaniaClient,
	gateway::ApiRequest,
	http::ApiHttpClient,
	model::{LeaderboardPosition, LeaderboardTop, PERSONAL_BEST_GROUP, TopEntry},
	obs::{self, OpKind},
	services::SCORE_POSITIONS_PATH,
};

impl<C> TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	/// Ranks each score on its map's personal-best leaderboard.
	///
	/// Scores are sent in batches (50 by default); a failed batch contributes nothing.
	pub async fn get_score_positions(
		&self,
		user: &UserId,
		scores: &BTreeMap<MapUid, i64>,
	) -> Result<HashMap<MapUid, LeaderboardPosition>> {
		if scores.is_empty() {
			return Ok(HashMap::new());
		}

		obs::observe(OpKind::Aggregate, "get_score_positions", async move {
			let entries = scores.iter().collect::<Vec<_>>();
			let batches = chunk::batches(&entries, self.config.limits.score_batch_size);
			let pages = chunk::dispatch(batches, self.config.limits.max_concurrency, |batch| {
				self.request_json::<Vec<LeaderboardPosition>>(user, score_request(batch))
			})
			.await;

			Ok(pages
				.into_iter()
				.flatten()
				.map(|position| (position.map_uid.clone(), position))
				.collect())
		})
		.await
	}

	/// Ranks one score on one map.
	pub async fn get_score_position(
		&self,
		user: &UserId,
		map_uid: &MapUid,
		score: i64,
	) -> Result<Option<LeaderboardPosition>> {
		let positions: Vec<LeaderboardPosition> =
			self.request_json(user, score_request(&[(map_uid, &score)])).await?;

		Ok(positions.into_iter().find(|position| &position.map_uid == map_uid))
	}

	/// Reads one page of a map's personal-best leaderboard.
	pub async fn get_map_top(
		&self,
		user: &UserId,
		map_uid: &MapUid,
		offset: usize,
		length: usize,
		only_world: bool,
	) -> Result<LeaderboardTop> {
		let path = format!("leaderboard/group/{PERSONAL_BEST_GROUP}/map/{map_uid}/top");
		let request = ApiRequest::get(Audience::Live, path)
			.param("onlyWorld", if only_world { "true" } else { "false" })
			.param("offset", offset)
			.param("length", length);

		self.request_json(user, request).await
	}

	/// Scans the world leaderboard of a map for the user's own entry.
	///
	/// Pages are read sequentially up to the configured cap. The scan ends with `None` on a page
	/// error or once the leaderboard runs out of entries.
	pub async fn get_my_position_from_top(
		&self,
		user: &UserId,
		map_uid: &MapUid,
	) -> Result<Option<TopEntry>> {
		let account_id = self
			.tokens
			.account_id(user, Audience::Live)
			.await?
			.ok_or(AuthError::MissingAccountId { audience: Audience::Live })?;
		let page_size = self.config.limits.top_page_size;

		obs::observe(OpKind::Aggregate, "get_my_position_from_top", async move {
			for page in 0..self.config.limits.top_scan_max_pages {
				let offset = page * page_size;
				let top = match self.get_map_top(user, map_uid, offset, page_size, true).await {
					Ok(top) => top,
					Err(e) => {
						tracing::warn!(%map_uid, offset, error = %e, "Leaderboard scan aborted.");

						return Ok(None);
					},
				};

				if let Some(entry) = find_my_position(&account_id, &top) {
					return Ok(Some(entry.clone()));
				}
				if top.tops.iter().all(|zone| zone.top.is_empty()) {
					break;
				}
			}

			Ok(None)
		})
		.await
	}
}

/// Finds `account_id` in a world-only top page.
///
/// Pages carrying several zones are ignored.
pub fn find_my_position<'a>(
	account_id: &AccountId,
	top: &'a LeaderboardTop,
) -> Option<&'a TopEntry> {
	match top.tops.as_slice() {
		[zone] => zone.top.iter().find(|entry| &entry.account_id == account_id),
		_ => None,
	}
}

fn score_request(batch: &[(&MapUid, &i64)]) -> ApiRequest {
	let maps = batch
		.iter()
		.map(|(uid, _)| serde_json::json!({ "mapUid": uid, "groupUid": PERSONAL_BEST_GROUP }))
		.collect::<Vec<_>>();

	batch.iter().fold(
		ApiRequest::post(Audience::Live, SCORE_POSITIONS_PATH).param("maps", maps),
		|request, (uid, score)| request.query_pair(format!("scores[{uid}]"), score.to_string()),
	)
}
