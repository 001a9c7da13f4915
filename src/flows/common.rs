//! Shared helpers for the handshakes and the gateway (request building, guards, parsing).

// crates.io
use oauth2::{
	HttpRequest, HttpResponse,
	http::{
		HeaderValue, Method, Request,
		header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
	},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	audience::Audience,
	auth::UserId,
	error::{ConfigError, MalformedError},
	flows::TrackmaniaClient,
	http::{self, ApiHttpClient},
};

/// Authorization scheme for platform session tickets.
pub const UBI_SCHEME: &str = "ubi_v1";
/// Authorization scheme for audience access and refresh tokens.
pub const NADEO_SCHEME: &str = "nadeo_v1";
/// Header carrying the platform application id.
pub const UBI_APP_ID_HEADER: &str = "Ubi-AppId";

const JSON: &str = "application/json";

/// Returns (and creates on demand) the singleflight guard for a (user, audience) pair.
pub(crate) fn flow_guard<C>(
	client: &TrackmaniaClient<C>,
	user: &UserId,
	audience: Audience,
) -> Arc<AsyncMutex<()>>
where
	C: ApiHttpClient,
{
	let mut guards = client.flow_guards.lock();

	guards
		.entry((user.clone(), audience))
		.or_insert_with(|| Arc::new(AsyncMutex::new(())))
		.clone()
}

/// Builds a JSON request carrying the configured user agent plus `headers`.
pub(crate) fn json_request(
	method: Method,
	url: &Url,
	user_agent: &str,
	headers: &[(&str, String)],
	body: Vec<u8>,
) -> Result<HttpRequest> {
	let mut builder =
		Request::builder().method(method).uri(url.as_str()).header(CONTENT_TYPE, JSON);

	if let Ok(value) = HeaderValue::from_str(user_agent) {
		builder = builder.header(USER_AGENT, value);
	}
	for (name, value) in headers {
		builder = builder.header(*name, value.as_str());
	}

	Ok(builder.body(body).map_err(ConfigError::from)?)
}

/// Builds the `Authorization` header pair for a scheme and secret.
pub(crate) fn authorization(value: String) -> (&'static str, String) {
	(AUTHORIZATION.as_str(), value)
}

/// Executes `request`, returning the response together with its status code.
pub(crate) async fn send<C>(
	client: &TrackmaniaClient<C>,
	target: &str,
	request: HttpRequest,
) -> Result<(u16, HttpResponse)>
where
	C: ApiHttpClient,
{
	let response = http::execute(client.http_client.as_ref(), target, request).await?;

	Ok((response.status().as_u16(), response))
}

/// Parses a JSON body with path-aware error reporting.
pub(crate) fn parse_json<T>(context: &str, body: &[u8]) -> Result<T, MalformedError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| MalformedError::Json { context: context.into(), source })
}
