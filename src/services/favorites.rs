//! Live-audience favorites: single pages and the full paginated list.

// self
use crate::{
	_prelude::*,
	audience::Audience,
	auth::UserId,
	chunk::{self, Page},
	flows::TrackmaniaClient,
	gateway::ApiRequest,
	http::ApiHttpClient,
	model::{FavoriteMap, FavoritePage},
	obs::{self, OpKind},
	services::FAVORITES_PATH,
};

impl<C> TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	/// Reads one page of the user's favorite maps.
	pub async fn get_favorite_maps(
		&self,
		user: &UserId,
		offset: usize,
		length: usize,
	) -> Result<FavoritePage> {
		let request = ApiRequest::get(Audience::Live, FAVORITES_PATH)
			.param("offset", offset)
			.param("length", length);

		self.request_json(user, request).await
	}

	/// Reads every favorite map, page by page, until the reported total is reached.
	pub async fn get_all_favorites(&self, user: &UserId) -> Result<Vec<FavoriteMap>> {
		let policy = self.pagination_policy(self.config.limits.favorites_page_size);

		obs::observe(
			OpKind::Aggregate,
			"get_all_favorites",
			chunk::paginate(policy, |offset, length| async move {
				let page = self.get_favorite_maps(user, offset, length).await?;

				Ok(Page { items: page.map_list, total: page.item_count })
			}),
		)
		.await
	}
}
