//! The dispatch core: every API call is authenticated, sent, and interpreted here.
//!
//! [`Dispatcher`] owns the base URL, the HTTP transport, and the active [`Authenticator`].
//! Resource accessors call the verb helpers ([`Dispatcher::get`], [`Dispatcher::post`],
//! [`Dispatcher::put`], [`Dispatcher::delete`]) with API paths; each builds a fresh
//! [`RequestDescriptor`] and funnels it through [`Dispatcher::dispatch`], which
//!
//! 1. lets the authenticator attach credentials (synchronously, exactly once),
//! 2. hands the request to the transport,
//! 3. passes transport failures through unchanged ([`Error::Transport`], or [`Error::Config`]
//!    when the request could not be built),
//! 4. maps non-2xx statuses onto [`ApiError`] (the body is ignored),
//! 5. unwraps the `data` member of successful bodies unless
//!    [`DispatchOptions::full_payload`] is set.
//!
//! Without an authenticator the dispatcher runs unauthenticated: requests are sent without
//! credentials and the API answers with `401`, surfacing as [`ApiErrorKind::NoAuthorization`].
//!
//! [`ApiErrorKind::NoAuthorization`]: crate::error::ApiErrorKind::NoAuthorization

// self
use crate::{
	_prelude::*,
	auth::Authenticator,
	error::{ApiError, ConfigError},
	http::{HttpTransport, TransportResponse},
	obs::{OpKind, OpSpan},
	request::{DispatchOptions, Method, Query, RequestDescriptor},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://app.asana.com/";
/// Header identifying the client library to the API.
pub const CLIENT_LIB_HEADER: &str = "X-Asana-Client-Lib";

const API_PREFIX: &str = "api/1.0";

/// Dispatcher specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestDispatcher = Dispatcher<ReqwestTransport>;

/// Construction-time settings for a [`Dispatcher`].
#[derive(Clone)]
pub struct DispatcherConfig {
	/// Initial authenticator; `None` runs unauthenticated.
	pub authenticator: Option<Arc<dyn Authenticator>>,
	/// Base URL that `api/1.0` and request paths are appended to; must end with `/`.
	pub asana_base_url: String,
	/// Headers added to every request before authentication.
	pub default_headers: BTreeMap<String, String>,
}
impl DispatcherConfig {
	/// Sets the initial authenticator.
	pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
		self.authenticator = Some(authenticator);

		self
	}

	/// Overrides the base URL (defaults to [`DEFAULT_BASE_URL`]).
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.asana_base_url = base_url.into();

		self
	}

	/// Adds or replaces a default header, e.g. `Asana-Enable` for API deprecation opt-ins.
	pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.default_headers.insert(name.into(), value.into());

		self
	}
}
impl Default for DispatcherConfig {
	fn default() -> Self {
		let mut default_headers = BTreeMap::new();

		default_headers.insert(
			CLIENT_LIB_HEADER.into(),
			format!("language=Rust&version={}", env!("CARGO_PKG_VERSION")),
		);

		Self { authenticator: None, asana_base_url: DEFAULT_BASE_URL.into(), default_headers }
	}
}
impl Debug for DispatcherConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DispatcherConfig")
			.field("authenticator_set", &self.authenticator.is_some())
			.field("asana_base_url", &self.asana_base_url)
			.field("default_headers", &self.default_headers)
			.finish()
	}
}

/// Chokepoint that turns API-call intents into authenticated requests and typed results.
///
/// Each dispatch is an independent future with no state carried between calls. The only
/// shared mutable state is the authenticator reference: [`Dispatcher::set_authenticator`] swaps
/// it without locking out in-flight calls, and a call that already read the old reference
/// completes with it.
pub struct Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	authenticator: RwLock<Option<Arc<dyn Authenticator>>>,
	asana_base_url: String,
	default_headers: BTreeMap<String, String>,
	transport: Arc<T>,
}
impl<T> Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a dispatcher that sends through the caller-provided transport.
	pub fn with_transport(config: DispatcherConfig, transport: impl Into<Arc<T>>) -> Self {
		let DispatcherConfig { authenticator, asana_base_url, default_headers } = config;

		Self {
			authenticator: RwLock::new(authenticator),
			asana_base_url,
			default_headers,
			transport: transport.into(),
		}
	}

	/// Returns the active authenticator, if any.
	pub fn authenticator(&self) -> Option<Arc<dyn Authenticator>> {
		self.authenticator.read().clone()
	}

	/// Replaces the active authenticator; later reads observe the new one immediately.
	pub fn set_authenticator(&self, authenticator: Arc<dyn Authenticator>) {
		*self.authenticator.write() = Some(authenticator);
	}

	/// Drops the active authenticator, returning to unauthenticated mode.
	pub fn clear_authenticator(&self) {
		*self.authenticator.write() = None;
	}

	/// Base URL requests are built from.
	pub fn asana_base_url(&self) -> &str {
		&self.asana_base_url
	}

	/// Transport used for every call.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Ensures the active authenticator holds valid credentials.
	///
	/// Resolves with exactly what [`Authenticator::ensure_credentials`] yields. Fails with
	/// [`ConfigError::MissingAuthenticator`] when none is configured.
	pub async fn authorize(&self) -> Result<()> {
		let authenticator = self.authenticator().ok_or(ConfigError::MissingAuthenticator)?;

		OpSpan::new(OpKind::Authorize, "authorize").run(authenticator.ensure_credentials()).await
	}

	/// Builds the absolute URL for an API path (which must start with `/`).
	pub fn url(&self, path: &str) -> String {
		format!("{}{API_PREFIX}{path}", self.asana_base_url)
	}

	/// `GET path`, with `query` as the query string when present.
	pub async fn get(
		&self,
		path: &str,
		query: Option<Query>,
		options: DispatchOptions,
	) -> Result<Value> {
		let mut request = RequestDescriptor::new(Method::Get, self.url(path));

		request.query = query;

		self.dispatch(request, options).await
	}

	/// `POST path` with `{"data": data}` as the body.
	pub async fn post(&self, path: &str, data: Value, options: DispatchOptions) -> Result<Value> {
		let request = RequestDescriptor::new(Method::Post, self.url(path)).with_data(data);

		self.dispatch(request, options).await
	}

	/// `PUT path` with `{"data": data}` as the body.
	pub async fn put(&self, path: &str, data: Value, options: DispatchOptions) -> Result<Value> {
		let request = RequestDescriptor::new(Method::Put, self.url(path)).with_data(data);

		self.dispatch(request, options).await
	}

	/// `DELETE path`.
	pub async fn delete(&self, path: &str, options: DispatchOptions) -> Result<Value> {
		let request = RequestDescriptor::new(Method::Delete, self.url(path));

		self.dispatch(request, options).await
	}

	/// Authenticates, sends, and interprets one request.
	pub async fn dispatch(
		&self,
		mut request: RequestDescriptor,
		options: DispatchOptions,
	) -> Result<Value> {
		OpSpan::new(OpKind::from(request.method), "dispatch")
			.run(async move {
				for (name, value) in &self.default_headers {
					request.headers.entry(name.clone()).or_insert_with(|| value.clone());
				}

				if let Some(authenticator) = self.authenticator() {
					authenticator.authenticate_request(&mut request);
				}

				let response = self.transport.send(request).await?;

				resolve_response(response, options)
			})
			.await
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestTransport> {
	/// Creates a dispatcher backed by a default reqwest transport.
	pub fn new(config: DispatcherConfig) -> Self {
		Self::with_transport(config, ReqwestTransport::default())
	}
}
impl<T> Debug for Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("asana_base_url", &self.asana_base_url)
			.field("authenticator_set", &self.authenticator.read().is_some())
			.finish()
	}
}

/// Decodes a resolved payload into `D`, reporting the failing path on mismatch.
pub fn decode<D>(payload: Value) -> Result<D>
where
	D: DeserializeOwned,
{
	serde_path_to_error::deserialize(payload).map_err(|source| Error::Decode { source })
}

fn resolve_response(response: TransportResponse, options: DispatchOptions) -> Result<Value> {
	if !response.is_success() {
		return Err(ApiError::from_status(response.status).into());
	}
	if options.full_payload {
		return Ok(response.body);
	}

	match response.body {
		Value::Object(mut envelope) => Ok(envelope.remove("data").unwrap_or(Value::Null)),
		_ => Ok(Value::Null),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ApiErrorKind;

	#[test]
	fn success_unwraps_data_member() {
		let body = serde_json::json!({ "data": { "gid": "1" }, "meta": { "next_page": null } });
		let value = resolve_response(TransportResponse::new(200, body), DispatchOptions::default())
			.expect("Successful responses should resolve.");

		assert_eq!(value, serde_json::json!({ "gid": "1" }));
	}

	#[test]
	fn missing_data_member_resolves_null() {
		let value = resolve_response(
			TransportResponse::new(200, serde_json::json!({ "meta": {} })),
			DispatchOptions::default(),
		)
		.expect("Missing data should still resolve.");

		assert_eq!(value, Value::Null);

		let value =
			resolve_response(TransportResponse::new(204, Value::Null), DispatchOptions::default())
				.expect("Empty bodies should still resolve.");

		assert_eq!(value, Value::Null);
	}

	#[test]
	fn full_payload_keeps_envelope() {
		let body = serde_json::json!({ "data": [1, 2], "next_page": { "offset": "abc" } });
		let value =
			resolve_response(TransportResponse::new(200, body.clone()), DispatchOptions::full_payload())
				.expect("Successful responses should resolve.");

		assert_eq!(value, body);
	}

	#[test]
	fn failure_status_ignores_body() {
		let body = serde_json::json!({ "errors": [{ "message": "task: Not a recognized ID" }] });
		let err = resolve_response(TransportResponse::new(404, body), DispatchOptions::default())
			.expect_err("404 should fail.");

		assert_eq!(err.as_api(), Some(&ApiError::not_found()));

		let err =
			resolve_response(TransportResponse::new(302, Value::Null), DispatchOptions::default())
				.expect_err("Redirect statuses should fail.");

		assert_eq!(err.as_api().map(ApiError::kind), Some(ApiErrorKind::Unexpected));
		assert_eq!(err.status(), Some(302));
	}

	#[test]
	fn default_config_targets_production_host() {
		let config = DispatcherConfig::default();

		assert!(config.authenticator.is_none());
		assert_eq!(config.asana_base_url, "https://app.asana.com/");
		assert!(config.default_headers.contains_key(CLIENT_LIB_HEADER));
	}

	#[test]
	fn decode_reports_failing_path() {
		#[derive(Debug, Deserialize)]
		struct User {
			#[allow(dead_code)]
			gid: String,
		}

		let err = decode::<User>(serde_json::json!({ "gid": 7 }))
			.expect_err("Numeric gid should not decode into a string.");

		match err {
			Error::Decode { source } => assert_eq!(source.path().to_string(), "gid"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
