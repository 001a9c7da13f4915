#![cfg(feature = "reqwest")]

// crates.io
use futures::future;
use httpmock::prelude::*;
use serde_json::json;
// self
use trackmania_broker::{
	_preludet::*,
	audience::Audience,
	auth::{TokenRecord, UserId},
	error::AuthError,
	store::{MemoryStore, TokenStore},
};

async fn seed_record(store: &Arc<MemoryStore>, user: &UserId, access: &str, expires_in: Duration) {
	let record = TokenRecord::builder()
		.access_token(access)
		.refresh_token("refresh-old")
		.expires_at(OffsetDateTime::now_utc() + expires_in)
		.build()
		.expect("Token record fixture should build successfully.");

	TokenStore::new(store.clone())
		.set(user, Audience::Live, &record)
		.await
		.expect("Failed to seed token record into the store.");
}

async fn mock_refresh(server: &MockServer, exp: i64) -> httpmock::Mock<'_> {
	let body = json!({ "accessToken": fake_jwt(exp), "refreshToken": "refresh-new" }).to_string();

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/token/refresh")
				.header("authorization", "nadeo_v1 t=refresh-old");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

#[tokio::test]
async fn refresh_rotates_tokens_and_updates_store() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, store) = build_reqwest_test_client(config);
	let user = test_user("alice");
	let exp = OffsetDateTime::now_utc().unix_timestamp() + 3_600;

	seed_record(&store, &user, "access-old", Duration::seconds(30)).await;

	let mock = mock_refresh(&server, exp).await;
	let record = client.refresh(&user, Audience::Live).await.expect("Refresh should succeed.");

	mock.assert_async().await;

	let stored =
		client.tokens.get(&user, Audience::Live).await.expect("Stored record should load.");

	assert_eq!(stored, record);
	assert_eq!(stored.access_token.as_ref().map(|s| s.expose().to_owned()), Some(fake_jwt(exp)));
	assert_eq!(stored.refresh_token.as_ref().map(|s| s.expose()), Some("refresh-new"));
	assert_eq!(stored.expires_at.map(|at| at.unix_timestamp()), Some(exp));
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn refresh_without_refresh_token_fails_fast() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, _) = build_reqwest_test_client(config);
	let mock = mock_refresh(&server, 0).await;
	let err = client
		.refresh(&test_user("alice"), Audience::Core)
		.await
		.expect_err("Refresh without a stored refresh token must fail.");

	assert!(matches!(
		err,
		Error::Auth(AuthError::MissingRefreshToken { audience: Audience::Core })
	));
	mock.assert_calls_async(0).await;
	assert_eq!(client.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn rejected_refresh_keeps_stored_state() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, store) = build_reqwest_test_client(config);
	let user = test_user("alice");

	seed_record(&store, &user, "access-old", Duration::seconds(30)).await;

	let before =
		client.tokens.get(&user, Audience::Live).await.expect("Seeded record should load.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/token/refresh");
			then.status(401).body("{\"error\":\"expired\"}");
		})
		.await;

	let err = client
		.refresh(&user, Audience::Live)
		.await
		.expect_err("Rejected refresh should surface.");

	assert!(matches!(
		err,
		Error::Auth(AuthError::RefreshRejected { audience: Audience::Live, status: 401 })
	));
	assert_eq!(
		client.tokens.get(&user, Audience::Live).await.expect("Record should still load."),
		before
	);
}

#[tokio::test]
async fn concurrent_requests_inside_the_margin_refresh_once() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, store) = build_reqwest_test_client(config);
	let user = test_user("alice");
	let exp = OffsetDateTime::now_utc().unix_timestamp() + 3_600;

	seed_record(&store, &user, "access-old", Duration::seconds(30)).await;

	let refresh = mock_refresh(&server, exp).await;
	let data = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/live/map/favorite")
				.header("authorization", format!("nadeo_v1 t={}", fake_jwt(exp)));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"itemCount\":0,\"mapList\":[]}");
		})
		.await;
	let pages = future::join_all((0..4).map(|_| client.get_favorite_maps(&user, 0, 20))).await;

	for page in pages {
		assert_eq!(page.expect("Every request should use the refreshed token.").item_count, 0);
	}

	refresh.assert_calls_async(1).await;
	data.assert_calls_async(4).await;
}

#[tokio::test]
async fn tokens_outside_the_margin_are_not_refreshed() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, store) = build_reqwest_test_client(config);
	let user = test_user("alice");

	seed_record(&store, &user, "access-old", Duration::minutes(10)).await;

	let refresh = mock_refresh(&server, 0).await;
	let record =
		client.ensure_fresh(&user, Audience::Live).await.expect("Fresh record should load.");

	assert_eq!(record.access_token.as_ref().map(|s| s.expose()), Some("access-old"));
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn failed_refresh_falls_back_to_the_stale_token() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, store) = build_reqwest_test_client(config);
	let user = test_user("alice");

	seed_record(&store, &user, "access-old", Duration::seconds(5)).await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/token/refresh");
			then.status(500);
		})
		.await;

	let data = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/live/map/favorite")
				.header("authorization", "nadeo_v1 t=access-old");
			then.status(200).body("{\"itemCount\":0}");
		})
		.await;
	let page = client
		.get_favorite_maps(&user, 0, 20)
		.await
		.expect("The request should proceed with the stale token.");

	data.assert_async().await;
	assert_eq!(page.item_count, 0);
	assert_eq!(client.refresh_metrics.failures(), 1);
}
