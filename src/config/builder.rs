// self
use crate::{
	_prelude::*,
	audience::Audience,
	config::{AuthEndpoints, ClientConfig, Limits},
};

/// Errors raised while constructing or validating configurations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigBuildError {
	/// Endpoints must use HTTPS (loopback hosts excepted).
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: String,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Base URLs must end with `/` so relative paths join underneath them.
	#[error("The {audience} base URL must end with `/`: {url}.")]
	BaseUrlWithoutTrailingSlash {
		/// Audience whose base URL is invalid.
		audience: Audience,
		/// Offending URL.
		url: String,
	},
	/// At least one audience must be minted at login.
	#[error("At least one audience must be configured.")]
	NoAudiences,
	/// The user agent cannot be empty.
	#[error("User agent cannot be empty.")]
	EmptyUserAgent,
	/// A size or count limit is zero.
	#[error("Limit `{name}` must be greater than zero.")]
	ZeroLimit {
		/// Limit name.
		name: &'static str,
	},
	/// The refresh margin is negative.
	#[error("Refresh margin cannot be negative.")]
	NegativeRefreshMargin,
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	config: ClientConfig,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with production defaults.
	pub fn new() -> Self {
		Self { config: ClientConfig::default() }
	}

	/// Sets the login (credential exchange) endpoint.
	pub fn login_url(mut self, url: Url) -> Self {
		self.config.auth.login = url;

		self
	}

	/// Sets the ticket → audience token exchange endpoint.
	pub fn token_exchange_url(mut self, url: Url) -> Self {
		self.config.auth.token_exchange = url;

		self
	}

	/// Sets the refresh endpoint.
	pub fn refresh_url(mut self, url: Url) -> Self {
		self.config.auth.refresh = url;

		self
	}

	/// Replaces all handshake endpoints.
	pub fn auth_endpoints(mut self, endpoints: AuthEndpoints) -> Self {
		self.config.auth = endpoints;

		self
	}

	/// Overrides the base URL of one audience.
	pub fn audience_base_url(mut self, audience: Audience, url: Url) -> Self {
		self.config.audience_base_urls.insert(audience, url);

		self
	}

	/// Restricts the audiences minted during login.
	pub fn audiences<I>(mut self, audiences: I) -> Self
	where
		I: IntoIterator<Item = Audience>,
	{
		let mut list = Vec::new();

		for audience in audiences {
			if !list.contains(&audience) {
				list.push(audience);
			}
		}

		self.config.audiences = list;

		self
	}

	/// Overrides the user agent.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.config.user_agent = user_agent.into();

		self
	}

	/// Overrides the application id sent at login.
	pub fn ubi_app_id(mut self, app_id: impl Into<String>) -> Self {
		self.config.ubi_app_id = app_id.into();

		self
	}

	/// Overrides the orchestration limits.
	pub fn limits(mut self, limits: Limits) -> Self {
		self.config.limits = limits;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigBuildError> {
		self.config.validate()?;

		Ok(self.config)
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ClientConfig {
	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), ConfigBuildError> {
		validate_endpoint("login", &self.auth.login)?;
		validate_endpoint("token exchange", &self.auth.token_exchange)?;
		validate_endpoint("refresh", &self.auth.refresh)?;

		for (audience, url) in &self.audience_base_urls {
			validate_endpoint(audience.name(), url)?;

			if !url.path().ends_with('/') {
				return Err(ConfigBuildError::BaseUrlWithoutTrailingSlash {
					audience: *audience,
					url: url.to_string(),
				});
			}
		}

		if self.audiences.is_empty() {
			return Err(ConfigBuildError::NoAudiences);
		}
		if self.user_agent.trim().is_empty() {
			return Err(ConfigBuildError::EmptyUserAgent);
		}

		validate_limits(&self.limits)
	}
}

fn validate_endpoint(name: &str, url: &Url) -> Result<(), ConfigBuildError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ConfigBuildError::InsecureEndpoint { endpoint: name.into(), url: url.to_string() })
	}
}

fn validate_limits(limits: &Limits) -> Result<(), ConfigBuildError> {
	if limits.refresh_margin_secs < 0 {
		return Err(ConfigBuildError::NegativeRefreshMargin);
	}

	for (name, value) in [
		("chunk_budget", limits.chunk_budget),
		("favorites_page_size", limits.favorites_page_size),
		("score_batch_size", limits.score_batch_size),
		("top_page_size", limits.top_page_size),
		("top_scan_max_pages", limits.top_scan_max_pages),
		("max_concurrency", limits.max_concurrency),
	] {
		if value == 0 {
			return Err(ConfigBuildError::ZeroLimit { name });
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn rejects_insecure_remote_endpoints() {
		let err = ClientConfig::builder()
			.refresh_url(url("http://example.com/refresh"))
			.build()
			.expect_err("Plain HTTP to a remote host must be rejected.");

		assert!(matches!(err, ConfigBuildError::InsecureEndpoint { .. }));

		ClientConfig::builder()
			.refresh_url(url("http://127.0.0.1:8080/refresh"))
			.build()
			.expect("Loopback endpoints are allowed for local testing.");
	}

	#[test]
	fn base_urls_need_trailing_slash() {
		let err = ClientConfig::builder()
			.audience_base_url(Audience::Live, url("https://example.com/api/token"))
			.build()
			.expect_err("Base URLs without a trailing slash must be rejected.");

		assert!(matches!(
			err,
			ConfigBuildError::BaseUrlWithoutTrailingSlash { audience: Audience::Live, .. }
		));
	}

	#[test]
	fn limits_and_audiences_are_validated() {
		let limits = Limits { score_batch_size: 0, ..Limits::default() };

		assert_eq!(
			ClientConfig::builder().limits(limits).build(),
			Err(ConfigBuildError::ZeroLimit { name: "score_batch_size" })
		);
		assert_eq!(
			ClientConfig::builder().audiences([]).build(),
			Err(ConfigBuildError::NoAudiences)
		);
		assert_eq!(
			ClientConfig::builder().user_agent(" ").build(),
			Err(ConfigBuildError::EmptyUserAgent)
		);

		let config = ClientConfig::builder()
			.audiences([Audience::Live, Audience::Live])
			.build()
			.expect("Duplicate audiences collapse into one.");

		assert_eq!(config.audiences, vec![Audience::Live]);
	}
}
