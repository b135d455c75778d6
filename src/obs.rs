//! Optional observability helpers for dispatch and credential operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `asana_client.op` with the `op` (operation)
//!   and `stage` (call site) fields.
//! - Enable `metrics` to increment the `asana_client_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.
//!
//! Credential material is never recorded.

// self
use crate::{_prelude::*, request::Method};

/// Operation kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// `GET` dispatch.
	Get,
	/// `POST` dispatch.
	Post,
	/// `PUT` dispatch.
	Put,
	/// `DELETE` dispatch.
	Delete,
	/// Credential check through the active authenticator.
	Authorize,
	/// Authorization-code exchange at the token endpoint.
	CodeExchange,
	/// Refresh-token exchange at the token endpoint.
	TokenRefresh,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Get => "get",
			OpKind::Post => "post",
			OpKind::Put => "put",
			OpKind::Delete => "delete",
			OpKind::Authorize => "authorize",
			OpKind::CodeExchange => "code_exchange",
			OpKind::TokenRefresh => "token_refresh",
		}
	}
}
impl From<Method> for OpKind {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => OpKind::Get,
			Method::Post => OpKind::Post,
			Method::Put => OpKind::Put,
			Method::Delete => OpKind::Delete,
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}

	/// Maps a finished result onto [`OpOutcome::Success`] or [`OpOutcome::Failure`].
	pub fn of<T>(result: &Result<T>) -> Self {
		if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure }
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Span around one dispatch or credential operation.
///
/// [`OpSpan::run`] records the attempt, drives the future inside the span (when `tracing` is
/// enabled), then records the outcome.
#[derive(Clone, Debug)]
pub struct OpSpan {
	kind: OpKind,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a span for `kind`; `stage` names the call site.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { kind, span: tracing::info_span!("asana_client.op", op = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self { kind }
		}
	}

	/// Operation kind this span reports.
	pub fn kind(&self) -> OpKind {
		self.kind
	}

	/// Runs `fut` inside the span and records its attempt and outcome.
	pub async fn run<Fut, T>(self, fut: Fut) -> Result<T>
	where
		Fut: Future<Output = Result<T>>,
	{
		record_op_outcome(self.kind, OpOutcome::Attempt);

		#[cfg(feature = "tracing")]
		let result = {
			use tracing::Instrument;

			fut.instrument(self.span).await
		};
		#[cfg(not(feature = "tracing"))]
		let result = fut.await;

		record_op_outcome(self.kind, OpOutcome::of(&result));

		result
	}
}

/// Increments `asana_client_op_total` for `kind` and `outcome` when `metrics` is enabled.
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!("asana_client_op_total", "op" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}
