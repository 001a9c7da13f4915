#![cfg(feature = "reqwest")]

// crates.io
use oauth2::http::HeaderMap;
// self
use trackmania_broker::{
	_preludet::*,
	audience::Audience,
	config::{ClientConfig, DEFAULT_USER_AGENT},
	error::TransportError,
	flows::TrackmaniaClient,
	gateway::ApiRequest,
	http::{ApiHttpClient, AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	store::{MemoryStore, TokenStore},
};

#[derive(Debug)]
enum FakeTransportError {
	Unreachable,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Unreachable => write!(f, "Host unreachable."),
		}
	}
}
impl StdError for FakeTransportError {}

/// Transport that records every request and answers with a canned body, or fails when no body is
/// configured.
#[derive(Clone, Default)]
struct FakeHttpClient {
	body: Option<&'static str>,
	requests: Arc<Mutex<Vec<(String, HeaderMap)>>>,
}
impl FakeHttpClient {
	fn answering(body: &'static str) -> Self {
		Self { body: Some(body), ..Default::default() }
	}

	fn recorded(&self) -> Vec<(String, HeaderMap)> {
		self.requests.lock().clone()
	}
}
impl ApiHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn handle(&self) -> Self::Handle {
		FakeHttpHandle { body: self.body, requests: self.requests.clone() }
	}
}

struct FakeHttpHandle {
	body: Option<&'static str>,
	requests: Arc<Mutex<Vec<(String, HeaderMap)>>>,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		self.requests.lock().push((request.uri().to_string(), request.headers().clone()));

		let body = self.body;

		Box::pin(async move {
			match body {
				Some(body) => Ok(HttpResponse::new(body.as_bytes().to_vec())),
				None => Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Unreachable))),
			}
		})
	}
}

fn build_client(http_client: FakeHttpClient) -> TrackmaniaClient<FakeHttpClient> {
	let config = ClientConfig::builder().build().expect("Default configuration should be valid.");
	let tokens = TokenStore::new(Arc::new(MemoryStore::default()));

	TrackmaniaClient::with_http_client(tokens, config, http_client)
}

#[tokio::test]
async fn transport_failures_surface_as_network_errors() {
	let http_client = FakeHttpClient::default();
	let client = build_client(http_client.clone());
	let err = client
		.request(&test_user("alice"), ApiRequest::get(Audience::Live, "map/favorite"))
		.await
		.expect_err("An unreachable host must fail the request.");

	match err {
		Error::Transport(TransportError::Network { target, source }) => {
			assert_eq!(target, "map/favorite");
			assert_eq!(source.to_string(), "Host unreachable.");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert_eq!(http_client.recorded().len(), 1);
}

#[tokio::test]
async fn custom_transports_receive_fully_built_requests() {
	let http_client = FakeHttpClient::answering("[]");
	let client = build_client(http_client.clone());
	let request = ApiRequest::get(Audience::Core, "maps/").param("mapUidList", "u1,u2");
	let infos: Vec<serde_json::Value> = client
		.request_json(&test_user("alice"), request)
		.await
		.expect("The canned body should decode.");
	let recorded = http_client.recorded();

	assert!(infos.is_empty());
	assert_eq!(recorded.len(), 1);
	assert_eq!(recorded[0].0, "https://prod.trackmania.core.nadeo.online/maps/?mapUidList=u1,u2");
	assert_eq!(
		recorded[0].1.get("user-agent").and_then(|value| value.to_str().ok()),
		Some(DEFAULT_USER_AGENT)
	);
	assert!(recorded[0].1.get("authorization").is_none());
}
