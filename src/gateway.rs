//! Authenticated requests against the audience data endpoints.
//!
//! Every request first runs [`TrackmaniaClient::ensure_fresh`] for its (user, audience) pair,
//! then sends the stored access token with the `nadeo_v1` scheme. GET parameters are encoded
//! into the query string; other methods send them as a JSON body.

pub use oauth2::http::Method;

// crates.io
use oauth2::HttpRequest;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	audience::Audience,
	auth::{TokenSecret, UserId},
	config::ClientConfig,
	error::{ConfigError, MalformedError},
	flows::{TrackmaniaClient, common},
	http::ApiHttpClient,
	obs::{self, OpKind},
};

/// Request against one audience's data endpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// Audience whose token and base URL are used.
	pub audience: Audience,
	/// Path relative to the audience base URL.
	pub path: String,
	/// HTTP method; only GET, POST, PUT, and DELETE are accepted.
	pub method: Method,
	/// Parameters sent as query (GET) or JSON body (other methods).
	pub params: Map<String, Value>,
	/// Query pairs appended verbatim regardless of the method.
	pub query: Vec<(String, String)>,
}
impl ApiRequest {
	/// Creates a request with no parameters.
	pub fn new(audience: Audience, method: Method, path: impl Into<String>) -> Self {
		Self { audience, path: path.into(), method, params: Map::new(), query: Vec::new() }
	}

	/// Shortcut for a GET request.
	pub fn get(audience: Audience, path: impl Into<String>) -> Self {
		Self::new(audience, Method::GET, path)
	}

	/// Shortcut for a POST request.
	pub fn post(audience: Audience, path: impl Into<String>) -> Self {
		Self::new(audience, Method::POST, path)
	}

	/// Adds or replaces one parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.params.insert(key.into(), value.into());

		self
	}

	/// Merges the fields of a serializable object into the parameters.
	pub fn params<T>(mut self, params: &T) -> Result<Self>
	where
		T: Serialize,
	{
		match serde_json::to_value(params).map_err(ConfigError::Params)? {
			Value::Object(fields) => self.params.extend(fields),
			Value::Null => {},
			other => {
				let err = serde::ser::Error::custom(format!("expected an object, got {other}"));

				return Err(ConfigError::Params(err).into());
			},
		}

		Ok(self)
	}

	/// Appends one raw query pair.
	pub fn query_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	fn url(&self, base: &Url) -> Result<Url> {
		let path = self.path.trim_start_matches('/');
		let mut url = base
			.join(path)
			.map_err(|source| ConfigError::InvalidPath { path: self.path.clone(), source })?;
		let mut pairs = Vec::new();

		if self.method == Method::GET {
			pairs = encode_query(&self.params);
		}

		pairs.extend(self.query.iter().cloned());

		if !pairs.is_empty() {
			url.query_pairs_mut().extend_pairs(pairs);

			// List separators stay literal so a comma-joined list costs one byte per item.
			if let Some(query) = url.query().map(|query| query.replace("%2C", ",")) {
				url.set_query(Some(&query));
			}
		}

		Ok(url)
	}

	fn body(&self) -> Result<Vec<u8>> {
		if self.method == Method::GET || self.params.is_empty() {
			return Ok(Vec::new());
		}

		Ok(serde_json::to_vec(&self.params).map_err(ConfigError::Params)?)
	}

	fn http_request(
		&self,
		config: &ClientConfig,
		access_token: Option<&TokenSecret>,
	) -> Result<HttpRequest> {
		let url = self.url(&config.base_url(self.audience))?;
		let headers = access_token
			.map(|token| common::authorization(token.authorization(common::NADEO_SCHEME)))
			.into_iter()
			.collect::<Vec<_>>();

		common::json_request(self.method.clone(), &url, &config.user_agent, &headers, self.body()?)
	}
}

/// Flattens parameters into query pairs.
///
/// Arrays expand to repeated `key[]=value` pairs and objects to `key[field]=value` pairs; both
/// come before the scalar pairs. `null` values are skipped.
pub fn encode_query(params: &Map<String, Value>) -> Vec<(String, String)> {
	let mut nested = Vec::new();
	let mut scalars = Vec::new();

	for (key, value) in params {
		match value {
			Value::Array(values) => {
				for value in values.iter().filter_map(scalar) {
					nested.push((format!("{key}[]"), value));
				}
			},
			Value::Object(fields) => {
				for (field, value) in fields {
					if let Some(value) = scalar(value) {
						nested.push((format!("{key}[{field}]"), value));
					}
				}
			},
			value => {
				if let Some(value) = scalar(value) {
					scalars.push((key.clone(), value));
				}
			},
		}
	}

	nested.extend(scalars);

	nested
}

fn scalar(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) => Some(s.clone()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Number(n) => Some(n.to_string()),
		other => Some(other.to_string()),
	}
}

fn check_method(method: &Method) -> Result<()> {
	if [Method::GET, Method::POST, Method::PUT, Method::DELETE].contains(method) {
		Ok(())
	} else {
		Err(Error::UnsupportedMethod { method: method.to_string() })
	}
}

impl<C> TrackmaniaClient<C>
where
	C: ApiHttpClient,
{
	/// Sends `request` on behalf of `user` and returns the raw response body.
	///
	/// Statuses of 400 and above fail with [`Error::Upstream`] without retrying.
	pub async fn request(&self, user: &UserId, request: ApiRequest) -> Result<Vec<u8>> {
		check_method(&request.method)?;

		obs::observe(OpKind::Request, "request", async move {
			let record = self.ensure_fresh(user, request.audience).await?;

			if record.access_token.is_none() {
				tracing::debug!(%user, audience = %request.audience, "No access token stored.");
			}

			let http_request = request
				.http_request(&self.config, record.access_token.as_ref())
				.inspect_err(|e| {
					tracing::warn!(
						%user,
						path = %request.path,
						error = %e,
						"Failed to build request."
					);
				})?;
			let (status, response) = common::send(self, &request.path, http_request).await?;

			if status >= 400 {
				tracing::warn!(%user, path = %request.path, status, "Upstream rejected request.");

				return Err(Error::Upstream { status, path: request.path });
			}

			Ok(response.into_body())
		})
		.await
	}

	/// Sends `request` and decodes the JSON response body.
	pub async fn request_json<T>(&self, user: &UserId, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let context = request.path.clone();
		let body = self.request(user, request).await?;

		common::parse_json(&context, &body).map_err(|e| {
			tracing::warn!(%user, path = %context, error = %e, "Failed to decode response.");

			e.into()
		})
	}

	/// Sends `request` and returns the response body as text.
	pub async fn request_text(&self, user: &UserId, request: ApiRequest) -> Result<String> {
		let context = request.path.clone();
		let body = self.request(user, request).await?;

		String::from_utf8(body).map_err(|_| {
			tracing::warn!(%user, path = %context, "Response body is not UTF-8.");

			MalformedError::NotUtf8 { context }.into()
		})
	}
}
