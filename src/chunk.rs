//! Request fan-out helpers: size-bounded chunking, fixed-size batching, bounded-parallel
//! dispatch, and offset/count pagination.

// std
use std::slice::Chunks;
// crates.io
use futures::stream::{self, StreamExt};
// self
use crate::_prelude::*;

/// Splits `items` into contiguous chunks whose comma-joined length stays within `budget`.
///
/// Each item costs its length plus one separator. The gateway sends list separators unescaped, so
/// for identifiers made of URL-safe characters the budget bounds the query length.
///
/// An item joins the current chunk only while the running cost stays at or below `budget`; an
/// item that alone exceeds the budget becomes its own chunk. Input order is preserved.
pub fn chunk_by_encoded_len<T>(items: &[T], budget: usize) -> Vec<&[T]>
where
	T: AsRef<str>,
{
	let mut chunks = Vec::new();
	let mut start = 0;
	let mut running = 0;

	for (idx, item) in items.iter().enumerate() {
		let cost = item.as_ref().len() + 1;

		if idx > start && running + cost > budget {
			chunks.push(&items[start..idx]);

			start = idx;
			running = 0;
		}

		running += cost;
	}

	if start < items.len() {
		chunks.push(&items[start..]);
	}

	chunks
}

/// Splits `items` into batches of at most `size` elements.
pub fn batches<T>(items: &[T], size: usize) -> Chunks<'_, T> {
	items.chunks(size.max(1))
}

/// Comma-joins identifiers for list query parameters.
pub fn join_ids<T>(items: &[T]) -> String
where
	T: AsRef<str>,
{
	items.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}

/// Runs one request per slice with at most `concurrency` in flight.
///
/// Results come back in input order. A failing slice is logged and contributes nothing.
pub async fn dispatch<S, F, Fut, T>(slices: S, concurrency: usize, request: F) -> Vec<T>
where
	S: IntoIterator,
	F: FnMut(S::Item) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let results = stream::iter(slices.into_iter().map(request))
		.buffered(concurrency.max(1))
		.collect::<Vec<_>>()
		.await;

	results
		.into_iter()
		.enumerate()
		.filter_map(|(idx, result)| match result {
			Ok(value) => Some(value),
			Err(e) => {
				tracing::warn!(slice = idx, error = %e, "Dropping failed request slice.");

				None
			},
		})
		.collect()
}

/// Page size and retry budget used by [`paginate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationPolicy {
	/// Items requested per page.
	pub page_size: usize,
	/// Retries granted to a failing page before pagination fails.
	pub max_page_retries: usize,
}

/// Items of one page plus the total reported by the endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
	/// Items on this page.
	pub items: Vec<T>,
	/// Total number of items across every page.
	pub total: usize,
}

/// Reads pages sequentially until the accumulated count reaches the reported total.
///
/// `fetch` receives `(offset, length)`; the offset is the number of items accumulated so far. A
/// failing page is retried at the same offset up to [`PaginationPolicy::max_page_retries`] times,
/// after which the last error is returned. An empty page ends pagination early.
pub async fn paginate<T, F, Fut>(policy: PaginationPolicy, mut fetch: F) -> Result<Vec<T>>
where
	F: FnMut(usize, usize) -> Fut,
	Fut: Future<Output = Result<Page<T>>>,
{
	let page_size = policy.page_size.max(1);
	let mut items = Vec::new();

	loop {
		let offset = items.len();
		let mut retries = 0;
		let page = loop {
			match fetch(offset, page_size).await {
				Ok(page) => break page,
				Err(e) if retries < policy.max_page_retries => {
					retries += 1;

					tracing::warn!(offset, retries, error = %e, "Retrying failed page.");
				},
				Err(e) => return Err(e),
			}
		};
		let total = page.total;

		if page.items.is_empty() {
			if offset < total {
				tracing::warn!(offset, total, "Empty page before the reported total; stopping.");
			}

			break;
		}

		items.extend(page.items);

		if items.len() >= total {
			break;
		}
	}

	Ok(items)
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	fn failure() -> Error {
		Error::Upstream { status: 500, path: "test".into() }
	}

	#[test]
	fn chunks_respect_budget_and_order() {
		let ids = (0..450).map(|i| format!("{i:020}")).collect::<Vec<_>>();
		let chunks = chunk_by_encoded_len(&ids, 7_000);

		assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![333, 117]);
		assert!(chunks.iter().all(|c| c.iter().map(|id| id.len() + 1).sum::<usize>() <= 7_000));
		assert_eq!(chunks.concat(), ids);
	}

	#[test]
	fn oversize_items_form_their_own_chunk() {
		let items = ["aaaa", "bbbbbbbbbbbbbbbbbbbb", "cc", "dd"];
		let chunks = chunk_by_encoded_len(&items, 10);

		assert_eq!(chunks, vec![&items[..1], &items[1..2], &items[2..]]);
		assert!(chunk_by_encoded_len::<&str>(&[], 10).is_empty());
	}

	#[test]
	fn batches_split_by_count() {
		let scores = (0..120).collect::<Vec<_>>();

		assert_eq!(batches(&scores, 50).map(<[_]>::len).collect::<Vec<_>>(), vec![50, 50, 20]);
		assert_eq!(join_ids(&["a", "b", "c"]), "a,b,c");
	}

	#[tokio::test]
	async fn dispatch_keeps_order_and_drops_failures() {
		let results = dispatch(0..6_usize, 3, |n| async move {
			if n == 2 { Err(failure()) } else { Ok(n * 10) }
		})
		.await;

		assert_eq!(results, vec![0, 10, 30, 40, 50]);
	}

	#[tokio::test]
	async fn paginate_accumulates_until_total() {
		let offsets = Arc::new(Mutex::new(Vec::new()));
		let policy = PaginationPolicy { page_size: 2, max_page_retries: 0 };
		let items = paginate(policy, |offset, length| {
			offsets.lock().push(offset);

			async move {
				let items = (offset..(offset + length).min(5)).collect::<Vec<_>>();

				Ok(Page { items, total: 5 })
			}
		})
		.await
		.expect("Pagination should succeed.");

		assert_eq!(items, vec![0, 1, 2, 3, 4]);
		assert_eq!(*offsets.lock(), vec![0, 2, 4]);
	}

	#[tokio::test]
	async fn paginate_retries_then_fails() {
		let calls = Arc::new(AtomicUsize::new(0));
		let policy = PaginationPolicy { page_size: 2, max_page_retries: 2 };
		let counter = calls.clone();
		let flaky = paginate(policy, move |offset, _| {
			let attempt = counter.fetch_add(1, Ordering::SeqCst);

			async move {
				// The second page fails once before succeeding.
				if offset == 2 && attempt == 1 {
					Err(failure())
				} else {
					Ok(Page { items: vec![offset, offset + 1], total: 4 })
				}
			}
		})
		.await
		.expect("A single failure should be retried.");

		assert_eq!(flaky, vec![0, 1, 2, 3]);
		assert_eq!(calls.load(Ordering::SeqCst), 3);

		let counter = Arc::new(AtomicUsize::new(0));
		let attempts = counter.clone();
		let err = paginate::<usize, _, _>(policy, move |_, _| {
			attempts.fetch_add(1, Ordering::SeqCst);

			async { Err(failure()) }
		})
		.await
		.expect_err("Persistent failures should surface.");

		assert!(matches!(err, Error::Upstream { status: 500, .. }));
		assert_eq!(counter.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn paginate_stops_on_empty_page() {
		let policy = PaginationPolicy { page_size: 10, max_page_retries: 0 };
		let items = paginate(policy, |offset, _| async move {
			let items = if offset == 0 { vec!["a", "b"] } else { Vec::new() };

			Ok(Page { items, total: 50 })
		})
		.await
		.expect("Pagination should stop cleanly.");

		assert_eq!(items, vec!["a", "b"]);
	}
}
