//! Core-audience lookups: personal records and map metadata.

// self
use crate::{
	_prelude::*,
	audience::Audience,
	auth::{AccountId, MapId, UserId},
	chunk,
	error::AuthError,
	flows::TrackmaniaClient,
	gateway::ApiRequest,
	http::ApiHttpClient,
	model::{MapInfo, MapLookup, RecordEntry},
	obs::{self, OpKind},
	services::{MAP_RECORDS_PATH, MAPS_PATH},
};

impl<C> TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	/// Reads personal records.
	///
	/// Without `account_ids` the account stored for the core audience at connect time is used.
	/// Without `map_ids` every record of the accounts is returned in one request; otherwise the
	/// map list is chunked against the URL budget and failed chunks are left out.
	pub async fn get_map_records(
		&self,
		user: &UserId,
		account_ids: Option<&[AccountId]>,
		map_ids: Option<&[MapId]>,
	) -> Result<Vec<RecordEntry>> {
		let accounts = match account_ids {
			Some(ids) => chunk::join_ids(ids),
			None => self
				.tokens
				.account_id(user, Audience::Core)
				.await?
				.ok_or(AuthError::MissingAccountId { audience: Audience::Core })?
				.to_string(),
		};
		let request =
			ApiRequest::get(Audience::Core, MAP_RECORDS_PATH).param("accountIdList", accounts);
		let Some(map_ids) = map_ids else {
			return self.request_json(user, request).await;
		};

		if map_ids.is_empty() {
			return Ok(Vec::new());
		}

		let budget = self.config.limits.chunk_budget.saturating_sub(request_len(&request));

		obs::observe(OpKind::Aggregate, "get_map_records", async move {
			let chunks = chunk::chunk_by_encoded_len(map_ids, budget);
			let pages = chunk::dispatch(chunks, self.config.limits.max_concurrency, |ids| {
				let request = request.clone().param("mapIdList", chunk::join_ids(ids));

				self.request_json::<Vec<RecordEntry>>(user, request)
			})
			.await;

			Ok(pages.into_iter().flatten().collect())
		})
		.await
	}

	/// Reads map metadata for the listed maps.
	///
	/// An empty lookup returns nothing without any request. Results follow the chunk order; a
	/// failed chunk is left out.
	pub async fn get_map_info(&self, user: &UserId, lookup: &MapLookup) -> Result<Vec<MapInfo>> {
		if lookup.is_empty() {
			return Ok(Vec::new());
		}

		obs::observe(OpKind::Aggregate, "get_map_info", async move {
			let values = lookup.values();
			let chunks = chunk::chunk_by_encoded_len(&values, self.config.limits.chunk_budget);
			let pages = chunk::dispatch(chunks, self.config.limits.max_concurrency, |ids| {
				let request = ApiRequest::get(Audience::Core, MAPS_PATH)
					.param(lookup.param(), chunk::join_ids(ids));

				self.request_json::<Vec<MapInfo>>(user, request)
			})
			.await;

			Ok(pages.into_iter().flatten().collect())
		})
		.await
	}
}

fn request_len(request: &ApiRequest) -> usize {
	request.params.iter().map(|(key, value)| key.len() + value.to_string().len() + 2).sum()
}
