//! Transport primitives for API calls.
//!
//! The module exposes [`HttpTransport`] alongside [`TransportResponse`] so downstream crates can
//! plug in custom HTTP clients. The dispatcher hands each authenticated [`RequestDescriptor`] to
//! [`HttpTransport::send`] and interprets the returned status and parsed JSON body itself;
//! transports only report failures that happen before an HTTP status is known.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")]
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
// self
use crate::{_prelude::*, request::RequestDescriptor};
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};
#[cfg(feature = "reqwest")] use crate::request::Method;

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<TransportResponse>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing API calls.
///
/// The trait is the dispatcher's only dependency on an HTTP stack and is injected at
/// construction time. Implementations must be `Send + Sync + 'static` so one transport can be
/// shared across dispatchers, and the futures they return must be `Send`.
///
/// # Contract
///
/// - Apply `method`, `url`, the flattened [`RequestDescriptor::query_pairs`], the JSON body,
///   [`crate::request::RequestAuth::header_value`] as `Authorization`, and any extra headers.
/// - Return `Err` only for failures before a status is known: [`Error::Config`] when the request
///   cannot be built (bad URL, invalid header), [`Error::Transport`] when it cannot be delivered
///   (DNS, connect, TLS, timeout). The dispatcher passes either through unchanged.
/// - Parse the body as JSON; an empty body becomes [`Value::Null`] and a non-JSON body becomes a
///   [`Value::String`] with the raw text.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the status and parsed body.
	fn send(&self, request: RequestDescriptor) -> TransportFuture<'_>;
}

/// Status and parsed JSON body of a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Parsed response body.
	pub body: Value,
}
impl TransportResponse {
	/// Creates a response from its parts.
	pub fn new(status: u16, body: Value) -> Self {
		Self { status, body }
	}

	/// Returns `true` for `2xx` statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Parses a raw response body following the [`HttpTransport`] contract.
pub fn parse_body(bytes: &[u8]) -> Value {
	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Value::Null;
	}

	serde_json::from_slice(bytes)
		.unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Redirects, timeouts, proxies, and TLS follow whatever the wrapped client is configured with.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Returns an `oauth2` client handle sharing this transport's connection pool.
	pub(crate) fn token_exchange_handle(&self) -> TokenExchangeHandle {
		TokenExchangeHandle(self.0.clone())
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestTransport(..)")
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: RequestDescriptor) -> TransportFuture<'_> {
		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = self.0.request(method, &request.url);
			let pairs = request.query_pairs();

			if !pairs.is_empty() {
				builder = builder.query(&pairs);
			}
			if request.accept_json {
				builder = builder.header(ACCEPT, "application/json");
			}
			if let Some(body) = &request.json_body {
				let encoded =
					serde_json::to_vec(body).map_err(|source| TransportError::Encode { source })?;

				builder = builder.header(CONTENT_TYPE, "application/json").body(encoded);
			}
			if let Some(auth) = &request.auth {
				builder = builder.header(AUTHORIZATION, auth.header_value());
			}
			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			let response = builder.send().await.map_err(map_reqwest_error)?;
			let status = response.status().as_u16();
			let bytes = response.bytes().await.map_err(map_reqwest_error)?;

			Ok(TransportResponse::new(status, parse_body(&bytes)))
		})
	}
}

#[cfg(feature = "reqwest")]
pub(crate) fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from(err).into()
}

/// `oauth2` HTTP client backed by reqwest, used for token-endpoint exchanges.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub(crate) struct TokenExchangeHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for TokenExchangeHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
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
