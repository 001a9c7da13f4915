//! Data operations built on the gateway: favorites, records, map metadata, leaderboard positions,
//! and the per-map joins.
//!
//! Identifier lists are chunked against the configured URL budget, position lookups are batched,
//! and slices run with bounded concurrency. A failed slice is logged and left out of the result.

pub mod favorites;
pub mod joins;
pub mod leaderboard;
pub mod maps;

pub use leaderboard::find_my_position;

// self
use crate::{chunk::PaginationPolicy, flows::TrackmaniaClient, http::ApiHttpClient};

/// Core endpoint serving map metadata.
pub const MAPS_PATH: &str = "maps/";
/// Core endpoint serving personal records.
pub const MAP_RECORDS_PATH: &str = "mapRecords/";
/// Live endpoint serving the favorites list.
pub const FAVORITES_PATH: &str = "map/favorite";
/// Live endpoint ranking scores on several maps.
pub const SCORE_POSITIONS_PATH: &str = "leaderboard/group/map";

impl<C> TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	pub(crate) fn pagination_policy(&self, page_size: usize) -> PaginationPolicy {
		PaginationPolicy { page_size, max_page_retries: self.config.limits.max_page_retries }
	}
}
