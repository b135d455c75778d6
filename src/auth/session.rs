//! Authorization Code + PKCE session state for the OAuth consent redirect.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::Secret, error::CredentialsError};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods surfaced via [`AuthorizationSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Parameters describing the consent redirect an [`AuthorizationSession`] is built for.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest<'a> {
	/// Authorization endpoint of the provider.
	pub authorize_endpoint: &'a Url,
	/// OAuth client identifier.
	pub client_id: &'a str,
	/// Redirect URI registered for the client.
	pub redirect_uri: &'a Url,
	/// Optional space-delimited scope string.
	pub scope: Option<&'a str>,
}

/// Handshake state for one authorization redirect.
///
/// Send the user to [`AuthorizationSession::authorize_url`], then check the returned `state`
/// with [`AuthorizationSession::validate_state`] and pass [`AuthorizationSession::pkce_verifier`]
/// to the code exchange.
#[derive(Clone)]
pub struct AuthorizationSession {
	/// Fully-formed authorize URL that callers should send end-users to.
	pub authorize_url: Url,
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	pkce: PkcePair,
}
impl AuthorizationSession {
	/// Builds a session with a fresh random state and PKCE pair.
	pub fn generate(request: AuthorizationRequest<'_>) -> Self {
		let state = random_string(STATE_LEN);
		let pkce = PkcePair::generate();
		let authorize_url = build_authorize_url(&request, &state, &pkce);

		Self { authorize_url, state, pkce }
	}

	/// PKCE code challenge derived from the secret verifier.
	pub fn code_challenge(&self) -> &str {
		&self.pkce.challenge
	}

	/// PKCE challenge method (currently always `S256`).
	pub fn code_challenge_method(&self) -> PkceCodeChallengeMethod {
		self.pkce.method
	}

	/// Secret verifier to send with the code exchange.
	pub fn pkce_verifier(&self) -> &Secret {
		&self.pkce.verifier
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(CredentialsError::StateMismatch.into())
		}
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("authorize_url", &self.authorize_url)
			.field("state", &self.state)
			.field("code_challenge", &self.pkce.challenge)
			.field("code_challenge_method", &self.pkce.method)
			.finish()
	}
}

#[derive(Clone)]
struct PkcePair {
	verifier: Secret,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier: Secret::new(verifier), challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

fn build_authorize_url(request: &AuthorizationRequest<'_>, state: &str, pkce: &PkcePair) -> Url {
	let mut url = request.authorize_endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", request.client_id);
	pairs.append_pair("redirect_uri", request.redirect_uri.as_str());

	if let Some(scope) = request.scope.filter(|value| !value.is_empty()) {
		pairs.append_pair("scope", scope);
	}

	pairs.append_pair("state", state);
	pairs.append_pair("code_challenge", &pkce.challenge);
	pairs.append_pair("code_challenge_method", pkce.method.as_str());

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn session() -> AuthorizationSession {
		let endpoint = Url::parse("https://app.asana.com/-/oauth_authorize")
			.expect("Authorize endpoint fixture should parse.");
		let redirect =
			Url::parse("https://example.com/cb").expect("Redirect fixture should parse.");

		AuthorizationSession::generate(AuthorizationRequest {
			authorize_endpoint: &endpoint,
			client_id: "client-123",
			redirect_uri: &redirect,
			scope: Some("default"),
		})
	}

	#[test]
	fn authorize_url_carries_state_and_challenge() {
		let session = session();
		let pairs: BTreeMap<String, String> = session.authorize_url.query_pairs().into_owned().collect();

		assert_eq!(session.state.len(), STATE_LEN);
		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(pairs.get("client_id").map(String::as_str), Some("client-123"));
		assert_eq!(pairs.get("redirect_uri").map(String::as_str), Some("https://example.com/cb"));
		assert_eq!(pairs.get("scope").map(String::as_str), Some("default"));
		assert_eq!(pairs.get("state"), Some(&session.state));
		assert_eq!(pairs.get("code_challenge").map(String::as_str), Some(session.code_challenge()));
		assert_eq!(pairs.get("code_challenge_method").map(String::as_str), Some("S256"));
		assert_eq!(
			session.code_challenge(),
			compute_pkce_challenge(session.pkce_verifier().expose())
		);
	}

	#[test]
	fn state_validation_errors_on_mismatch() {
		let session = session();
		let state = session.state.clone();

		assert!(session.validate_state(&state).is_ok());

		let err = session.validate_state("other").expect_err("State mismatch should fail.");

		assert!(matches!(err, Error::Credentials(CredentialsError::StateMismatch)));
	}
}
