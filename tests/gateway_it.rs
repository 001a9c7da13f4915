#![cfg(feature = "reqwest")]

// std
use std::io::{Result as IoResult, Write};
// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use trackmania_broker::{
	_preludet::*,
	audience::Audience,
	auth::{TokenRecord, UserId},
	error::ConfigError,
	gateway::{ApiRequest, Method},
	store::{MemoryStore, TokenStore},
};

const MAPS: &str = "maps/";

/// Collects formatted log lines emitted while a subscriber guard is alive.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);
impl LogBuffer {
	fn capture(&self) -> tracing::subscriber::DefaultGuard {
		let writer = self.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_ansi(false)
			.with_writer(move || writer.clone())
			.finish();

		tracing::subscriber::set_default(subscriber)
	}

	fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock()).into_owned()
	}
}
impl Write for LogBuffer {
	fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
		self.0.lock().extend_from_slice(buf);

		Ok(buf.len())
	}

	fn flush(&mut self) -> IoResult<()> {
		Ok(())
	}
}

async fn seed_access_token(store: &Arc<MemoryStore>, user: &UserId, audience: Audience) {
	let record = TokenRecord::builder()
		.access_token("access-1")
		.refresh_token("refresh-1")
		.expires_at(OffsetDateTime::now_utc() + Duration::hours(1))
		.build()
		.expect("Token record fixture should build successfully.");

	TokenStore::new(store.clone())
		.set(user, audience, &record)
		.await
		.expect("Failed to seed token record into the store.");
}

#[tokio::test]
async fn unsupported_methods_fail_before_any_request() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, _) = build_reqwest_test_client(config);
	let any = server
		.mock_async(|when, then| {
			when.method(PATCH).path("/live/map/favorite");
			then.status(200);
		})
		.await;
	let request = ApiRequest::new(Audience::Live, Method::PATCH, "map/favorite");
	let err = client
		.request(&test_user("alice"), request)
		.await
		.expect_err("PATCH must be rejected.");

	assert_eq!(err.payload().error, "Bad HTTP method: PATCH.");
	any.assert_calls_async(0).await;
}

#[tokio::test]
async fn get_requests_carry_query_and_token() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, store) = build_reqwest_test_client(config);
	let user = test_user("alice");

	seed_access_token(&store, &user, Audience::Live).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/live/map/favorite")
				.header("authorization", "nadeo_v1 t=access-1")
				.query_param("offset", "0")
				.query_param("length", "20")
				.query_param("ids[]", "a");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"itemCount\":3}");
		})
		.await;
	let request = ApiRequest::get(Audience::Live, "map/favorite")
		.param("offset", 0)
		.param("length", 20)
		.param("ids", vec!["a"]);
	let body: Value =
		client.request_json(&user, request).await.expect("The request should succeed.");

	mock.assert_async().await;
	assert_eq!(body["itemCount"], 3);
}

#[tokio::test]
async fn post_requests_send_params_as_json() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, store) = build_reqwest_test_client(config);
	let user = test_user("alice");

	seed_access_token(&store, &user, Audience::Core).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/core/things")
				.query_param("scope", "all")
				.json_body(json!({ "name": "A01", "tags": ["x"] }));
			then.status(200).body("[]");
		})
		.await;
	let request = ApiRequest::post(Audience::Core, "/things")
		.param("name", "A01")
		.param("tags", vec!["x"])
		.query_pair("scope", "all");
	let body: Vec<Value> =
		client.request_json(&user, request).await.expect("The request should succeed.");

	mock.assert_async().await;
	assert!(body.is_empty());
}

#[tokio::test]
async fn upstream_errors_surface_as_bad_credentials() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, store) = build_reqwest_test_client(config);
	let user = test_user("alice");

	seed_access_token(&store, &user, Audience::Live).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/live/map/favorite");
			then.status(401).body("{\"error\":\"Unauthorized\"}");
		})
		.await;
	let err = client
		.request(&user, ApiRequest::get(Audience::Live, "map/favorite"))
		.await
		.expect_err("HTTP 401 must fail the request.");

	mock.assert_calls_async(1).await;
	assert!(err.is_auth());
	assert!(matches!(&err, Error::Upstream { status: 401, path } if path == "map/favorite"));
	assert!(err.payload().error.starts_with("Bad credentials"));
}

#[tokio::test]
async fn malformed_bodies_are_reported() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, _) = build_reqwest_test_client(config);
	let logs = LogBuffer::default();
	let _guard = logs.capture();

	server
		.mock_async(|when, then| {
			when.method(GET).path("/core/maps/");
			then.status(200).body("<html>maintenance</html>");
		})
		.await;

	let err = client
		.request_json::<Vec<Value>>(&test_user("alice"), ApiRequest::get(Audience::Core, MAPS))
		.await
		.expect_err("HTML must not decode as JSON.");
	let logs = logs.contents();

	assert!(matches!(err, Error::MalformedResponse(_)));
	assert!(logs.contains("WARN"));
	assert!(logs.contains("Failed to decode response."));
	assert!(logs.contains("path=maps/"));
}

#[tokio::test]
async fn request_construction_failures_are_logged() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, _) = build_reqwest_test_client(config);
	let logs = LogBuffer::default();
	let _guard = logs.capture();
	let err = client
		.request(&test_user("alice"), ApiRequest::get(Audience::Core, "http://["))
		.await
		.expect_err("An unparsable path must fail the request.");

	assert!(matches!(err, Error::Config(ConfigError::InvalidPath { .. })));
	assert!(logs.contents().contains("Failed to build request."));
}

#[tokio::test]
async fn missing_tokens_send_no_authorization_header() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Test configuration should be valid.");
	let (client, _) = build_reqwest_test_client(config);
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/live/session").header_missing("authorization");
			then.status(200).body("bye");
		})
		.await;
	let request = ApiRequest::new(Audience::Live, Method::DELETE, "session");
	let text = client
		.request_text(&test_user("alice"), request)
		.await
		.expect("The request should succeed.");

	mock.assert_async().await;
	assert_eq!(text, "bye");
}
