//! Credential attachment and acquisition.
//!
//! Every outbound request passes through exactly one [`Authenticator`]. The dispatcher calls
//! [`Authenticator::authenticate_request`] synchronously right before handing the request to the
//! transport, and [`Authenticator::ensure_credentials`] whenever a caller asks it to authorize.
//! Concrete variants live in sibling modules: [`BasicAuthenticator`] for API keys and personal
//! access tokens, [`OauthAuthenticator`] for bearer tokens that may need a refresh.

pub mod basic;
pub mod oauth;
pub mod secret;
pub mod session;

pub use basic::*;
pub use oauth::*;
pub use secret::*;
pub use session::*;

// self
use crate::{_prelude::*, request::RequestDescriptor};

/// Boxed future returned by [`Authenticator::ensure_credentials`].
pub type CredentialsFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// Pluggable credential capability consulted by the dispatcher.
///
/// Implementations are shared as `Arc<dyn Authenticator>` and may be swapped at runtime, so they
/// must be `Send + Sync + 'static`.
pub trait Authenticator
where
	Self: 'static + Send + Sync,
{
	/// Attaches the current credential material to `request` in place.
	///
	/// Must not perform I/O or block; the dispatcher calls it on the request path without
	/// suspending.
	fn authenticate_request(&self, request: &mut RequestDescriptor);

	/// Resolves once valid credentials are available, fetching or refreshing them if needed.
	///
	/// Calling this while credentials are already valid resolves immediately without side
	/// effects.
	fn ensure_credentials(&self) -> CredentialsFuture<'_>;

	/// Returns `request` with credentials attached.
	fn authenticate(&self, mut request: RequestDescriptor) -> RequestDescriptor {
		self.authenticate_request(&mut request);

		request
	}
}
