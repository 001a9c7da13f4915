//! Transport primitives for the handshake and data requests.
//!
//! The client depends on an HTTP stack only through [`ApiHttpClient`], which hands out
//! [`AsyncHttpClient`] handles executing `http::Request<Vec<u8>>` values. [`ReqwestHttpClient`]
//! is the default implementation.

pub use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Abstraction over HTTP transports capable of executing the client's requests.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared across client clones,
/// and the handles they return must own whatever state is required so their request futures
/// remain `Send` for the lifetime of the in-flight operation.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single request.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for one request.
	fn handle(&self) -> Self::Handle;
}

/// Sends `request` through `client` and maps transport failures onto [`TransportError`].
pub(crate) async fn execute<C>(
	client: &C,
	target: &str,
	request: HttpRequest,
) -> Result<HttpResponse>
where
	C: ?Sized + ApiHttpClient,
{
	let handle = client.handle();

	handle.call(request).await.map_err(|e| {
		let err = map_transport_error(target, e);

		tracing::warn!(target_url = target, error = %err, "Transport failure.");

		err.into()
	})
}

fn map_transport_error<E>(target: &str, err: HttpClientError<E>) -> TransportError
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(source) => TransportError::network(target, *source),
		HttpClientError::Io(source) => TransportError::Io(source),
		HttpClientError::Http(source) => TransportError::network(target, source),
		HttpClientError::Other(message) => TransportError::Other { target: target.into(), message },
		other => TransportError::Other { target: target.into(), message: other.to_string() },
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`ApiHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
