//! Status-keyed API error taxonomy.

// self
use crate::_prelude::*;

/// Closed set of failure kinds the Asana API reports through HTTP status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiErrorKind {
	/// `400`: malformed request or invalid parameters.
	InvalidRequest,
	/// `401`: missing or invalid credentials.
	NoAuthorization,
	/// `402`: the feature requires a paid plan.
	PaymentRequired,
	/// `403`: credentials lack access to the resource.
	Forbidden,
	/// `404`: the resource does not exist or is not visible.
	NotFound,
	/// `412`: a precondition (such as a sync token) no longer holds.
	PreconditionFailed,
	/// `429`: the caller exceeded the rate limit.
	RateLimit,
	/// `500`: internal server error.
	ServerError,
	/// `503`: the API is temporarily unavailable.
	ServiceUnavailable,
	/// Any other non-success status.
	Unexpected,
}
impl ApiErrorKind {
	/// Every kind with a fixed status code, in status order.
	pub const MAPPED: [Self; 9] = [
		Self::InvalidRequest,
		Self::NoAuthorization,
		Self::PaymentRequired,
		Self::Forbidden,
		Self::NotFound,
		Self::PreconditionFailed,
		Self::RateLimit,
		Self::ServerError,
		Self::ServiceUnavailable,
	];

	/// Looks up the kind mapped to `status`, returning `None` for unmapped codes.
	pub const fn from_status(status: u16) -> Option<Self> {
		let kind = match status {
			400 => Self::InvalidRequest,
			401 => Self::NoAuthorization,
			402 => Self::PaymentRequired,
			403 => Self::Forbidden,
			404 => Self::NotFound,
			412 => Self::PreconditionFailed,
			429 => Self::RateLimit,
			500 => Self::ServerError,
			503 => Self::ServiceUnavailable,
			_ => return None,
		};

		Some(kind)
	}

	/// Returns the status code tied to the kind; [`ApiErrorKind::Unexpected`] has none.
	pub const fn status(self) -> Option<u16> {
		match self {
			Self::InvalidRequest => Some(400),
			Self::NoAuthorization => Some(401),
			Self::PaymentRequired => Some(402),
			Self::Forbidden => Some(403),
			Self::NotFound => Some(404),
			Self::PreconditionFailed => Some(412),
			Self::RateLimit => Some(429),
			Self::ServerError => Some(500),
			Self::ServiceUnavailable => Some(503),
			Self::Unexpected => None,
		}
	}

	/// Default human-readable message for the kind.
	pub const fn default_message(self) -> &'static str {
		match self {
			Self::InvalidRequest => "Invalid Request",
			Self::NoAuthorization => "No Authorization",
			Self::PaymentRequired => "Payment Required",
			Self::Forbidden => "Forbidden",
			Self::NotFound => "Not Found",
			Self::PreconditionFailed => "Precondition Failed",
			Self::RateLimit => "Rate Limit Enforced",
			Self::ServerError => "Server Error",
			Self::ServiceUnavailable => "Service Unavailable",
			Self::Unexpected => "Unexpected Status",
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InvalidRequest => "invalid_request",
			Self::NoAuthorization => "no_authorization",
			Self::PaymentRequired => "payment_required",
			Self::Forbidden => "forbidden",
			Self::NotFound => "not_found",
			Self::PreconditionFailed => "precondition_failed",
			Self::RateLimit => "rate_limit",
			Self::ServerError => "server_error",
			Self::ServiceUnavailable => "service_unavailable",
			Self::Unexpected => "unexpected",
		}
	}
}
impl Display for ApiErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Typed failure built from an HTTP status returned by the API.
///
/// Values compare structurally, so a received error equals a freshly constructed one with the
/// same kind, status, and message (e.g. `ApiError::not_found()` for a bare `404`).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Asana API returned HTTP {status}: {message}.")]
pub struct ApiError {
	kind: ApiErrorKind,
	status: u16,
	message: String,
}
impl ApiError {
	/// Builds the error for `status`, falling back to [`ApiErrorKind::Unexpected`] for unmapped
	/// codes.
	pub fn from_status(status: u16) -> Self {
		match ApiErrorKind::from_status(status) {
			Some(kind) => Self::with_kind(kind, status),
			None => Self::unexpected(status),
		}
	}

	/// `400 Invalid Request`.
	pub fn invalid_request() -> Self {
		Self::with_kind(ApiErrorKind::InvalidRequest, 400)
	}

	/// `401 No Authorization`.
	pub fn no_authorization() -> Self {
		Self::with_kind(ApiErrorKind::NoAuthorization, 401)
	}

	/// `402 Payment Required`.
	pub fn payment_required() -> Self {
		Self::with_kind(ApiErrorKind::PaymentRequired, 402)
	}

	/// `403 Forbidden`.
	pub fn forbidden() -> Self {
		Self::with_kind(ApiErrorKind::Forbidden, 403)
	}

	/// `404 Not Found`.
	pub fn not_found() -> Self {
		Self::with_kind(ApiErrorKind::NotFound, 404)
	}

	/// `412 Precondition Failed`.
	pub fn precondition_failed() -> Self {
		Self::with_kind(ApiErrorKind::PreconditionFailed, 412)
	}

	/// `429 Rate Limit Enforced`.
	pub fn rate_limit() -> Self {
		Self::with_kind(ApiErrorKind::RateLimit, 429)
	}

	/// `500 Server Error`.
	pub fn server_error() -> Self {
		Self::with_kind(ApiErrorKind::ServerError, 500)
	}

	/// `503 Service Unavailable`.
	pub fn service_unavailable() -> Self {
		Self::with_kind(ApiErrorKind::ServiceUnavailable, 503)
	}

	/// Unmapped status; the raw code is preserved.
	pub fn unexpected(status: u16) -> Self {
		Self::with_kind(ApiErrorKind::Unexpected, status)
	}

	/// Replaces the default message.
	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = message.into();

		self
	}

	/// Failure kind.
	pub fn kind(&self) -> ApiErrorKind {
		self.kind
	}

	/// HTTP status code that produced the error.
	pub fn status(&self) -> u16 {
		self.status
	}

	/// Human-readable message.
	pub fn message(&self) -> &str {
		&self.message
	}

	fn with_kind(kind: ApiErrorKind, status: u16) -> Self {
		Self { kind, status, message: kind.default_message().into() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn mapped_kinds_round_trip_through_status() {
		for kind in ApiErrorKind::MAPPED {
			let status = kind.status().expect("Mapped kinds must carry a status.");
			let err = ApiError::from_status(status);

			assert_eq!(ApiErrorKind::from_status(status), Some(kind));
			assert_eq!(err.kind(), kind);
			assert_eq!(err.status(), status);
			assert_eq!(err.message(), kind.default_message());
		}
	}

	#[test]
	fn named_constructors_match_status_lookup() {
		assert_eq!(ApiError::from_status(400), ApiError::invalid_request());
		assert_eq!(ApiError::from_status(401), ApiError::no_authorization());
		assert_eq!(ApiError::from_status(402), ApiError::payment_required());
		assert_eq!(ApiError::from_status(403), ApiError::forbidden());
		assert_eq!(ApiError::from_status(404), ApiError::not_found());
		assert_eq!(ApiError::from_status(412), ApiError::precondition_failed());
		assert_eq!(ApiError::from_status(429), ApiError::rate_limit());
		assert_eq!(ApiError::from_status(500), ApiError::server_error());
		assert_eq!(ApiError::from_status(503), ApiError::service_unavailable());
	}

	#[test]
	fn unmapped_status_keeps_raw_code() {
		let err = ApiError::from_status(418);

		assert_eq!(err.kind(), ApiErrorKind::Unexpected);
		assert_eq!(err.status(), 418);
		assert_eq!(ApiErrorKind::Unexpected.status(), None);
		assert_eq!(ApiErrorKind::from_status(302), None);
	}

	#[test]
	fn message_override_is_structural() {
		let err = ApiError::not_found().with_message("Task is gone");

		assert_ne!(err, ApiError::not_found());
		assert_eq!(err, ApiError::not_found().with_message("Task is gone"));
		assert_eq!(err.to_string(), "Asana API returned HTTP 404: Task is gone.");
	}
}
