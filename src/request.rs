//! In-memory model of one outbound API call.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, auth::Secret};

/// Query-string map sent with a request.
pub type Query = BTreeMap<String, QueryValue>;

/// HTTP verbs used by the Asana API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the wire name of the verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Single- or multi-valued query parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
	/// `key=value`
	One(String),
	/// Repeated `key=a&key=b`.
	Many(Vec<String>),
}
impl QueryValue {
	/// Iterates the values in wire order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		let values = match self {
			QueryValue::One(value) => std::slice::from_ref(value),
			QueryValue::Many(values) => values.as_slice(),
		};

		values.iter().map(String::as_str)
	}
}
impl From<&str> for QueryValue {
	fn from(value: &str) -> Self {
		Self::One(value.into())
	}
}
impl From<String> for QueryValue {
	fn from(value: String) -> Self {
		Self::One(value)
	}
}
impl From<Vec<String>> for QueryValue {
	fn from(values: Vec<String>) -> Self {
		Self::Many(values)
	}
}
impl From<Vec<&str>> for QueryValue {
	fn from(values: Vec<&str>) -> Self {
		Self::Many(values.into_iter().map(Into::into).collect())
	}
}

/// Credential material attached by an [`crate::auth::Authenticator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestAuth {
	/// HTTP basic auth.
	Basic {
		/// Basic-auth username (the API key for key-based auth).
		username: Secret,
		/// Optional password; rendered as empty when absent.
		password: Option<Secret>,
	},
	/// `Authorization: Bearer <token>`.
	Bearer(Secret),
}
impl RequestAuth {
	/// Renders the `Authorization` header value for the credential.
	///
	/// The returned string contains secret material and must not be logged.
	pub fn header_value(&self) -> String {
		match self {
			RequestAuth::Basic { username, password } => {
				let pair = format!(
					"{}:{}",
					username.expose(),
					password.as_ref().map(Secret::expose).unwrap_or_default()
				);

				format!("Basic {}", STANDARD.encode(pair))
			},
			RequestAuth::Bearer(token) => format!("Bearer {}", token.expose()),
		}
	}
}

/// One outbound call before it reaches the transport.
///
/// Built fresh per call by the dispatcher, mutated once by the active authenticator, then moved
/// into [`crate::http::HttpTransport::send`].
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
	/// HTTP verb.
	pub method: Method,
	/// Absolute request URL.
	pub url: String,
	/// Query-string map; `None` sends no query string.
	pub query: Option<Query>,
	/// JSON request body.
	pub json_body: Option<Value>,
	/// Credentials attached by the authenticator.
	pub auth: Option<RequestAuth>,
	/// Additional request headers.
	pub headers: BTreeMap<String, String>,
	/// Requests a JSON response; always `true` for descriptors built by this crate.
	pub accept_json: bool,
}
impl RequestDescriptor {
	/// Creates a descriptor with no query, body, credentials, or extra headers.
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self {
			method,
			url: url.into(),
			query: None,
			json_body: None,
			auth: None,
			headers: BTreeMap::new(),
			accept_json: true,
		}
	}

	/// Sets the query-string map.
	pub fn with_query(mut self, query: Query) -> Self {
		self.query = Some(query);

		self
	}

	/// Sets the raw JSON body.
	pub fn with_json_body(mut self, body: Value) -> Self {
		self.json_body = Some(body);

		self
	}

	/// Wraps `data` in the API's request envelope (`{"data": ...}`) and sets it as the body.
	pub fn with_data(self, data: Value) -> Self {
		self.with_json_body(serde_json::json!({ "data": data }))
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Flattens the query map into `(key, value)` pairs, repeating keys for multi-valued entries.
	pub fn query_pairs(&self) -> Vec<(&str, &str)> {
		self.query
			.iter()
			.flatten()
			.flat_map(|(key, value)| value.iter().map(move |v| (key.as_str(), v)))
			.collect()
	}
}

/// Per-call dispatch options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOptions {
	/// Resolve with the whole response body instead of its `data` member.
	pub full_payload: bool,
}
impl DispatchOptions {
	/// Options that keep the full response body (including `meta` / pagination fields).
	pub fn full_payload() -> Self {
		Self { full_payload: true }
	}

	/// Overrides the full-payload flag.
	pub fn with_full_payload(mut self, full_payload: bool) -> Self {
		self.full_payload = full_payload;

		self
	}
}
