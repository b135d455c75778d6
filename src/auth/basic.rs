//! Static API key / personal access token authenticator.

// self
use crate::{
	_prelude::*,
	auth::{Authenticator, CredentialsFuture, Secret},
	request::{RequestAuth, RequestDescriptor},
};

/// Authenticator that always holds valid credentials: a fixed key sent as HTTP basic auth.
///
/// The key travels as the basic-auth username with an empty password.
#[derive(Clone, Debug)]
pub struct BasicAuthenticator {
	api_key: Secret,
}
impl BasicAuthenticator {
	/// Creates an authenticator for the provided key.
	pub fn new(api_key: impl Into<Secret>) -> Self {
		Self { api_key: api_key.into() }
	}

	/// Returns the wrapped key.
	pub fn api_key(&self) -> &Secret {
		&self.api_key
	}
}
impl Authenticator for BasicAuthenticator {
	fn authenticate_request(&self, request: &mut RequestDescriptor) {
		request.auth = Some(RequestAuth::Basic { username: self.api_key.clone(), password: None });
	}

	fn ensure_credentials(&self) -> CredentialsFuture<'_> {
		Box::pin(std::future::ready(Ok(())))
	}
}
