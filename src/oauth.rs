//! Asana OAuth application: consent URL, code exchange, and token refresh.
//!
//! [`OauthApp`] wraps the `oauth2` crate's basic client with Asana's endpoints and the crate's
//! reqwest transport. It implements [`CredentialRefresher`], so an
//! [`OauthAuthenticator`] built with [`OauthApp::authenticator`] refreshes expired tokens on
//! its own.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{
		AuthorizationRequest, AuthorizationSession, CredentialRefresher, OauthAuthenticator,
		OauthCredentials, RefreshFuture, Secret,
	},
	error::{ConfigError, CredentialsError, TransportError},
	http::{ReqwestTransport, map_reqwest_error},
	obs::{OpKind, OpSpan},
};

/// Asana's authorization endpoint.
pub const ASANA_AUTHORIZE_URL: &str = "https://app.asana.com/-/oauth_authorize";
/// Asana's token endpoint.
pub const ASANA_TOKEN_URL: &str = "https://app.asana.com/-/oauth_token";
/// Redirect URI for native apps that display the code to the user instead of redirecting.
pub const NATIVE_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;

/// Registered OAuth application used to obtain and refresh user tokens.
#[derive(Clone)]
pub struct OauthApp {
	client_id: String,
	client_secret: Option<Secret>,
	redirect_uri: Url,
	authorize_endpoint: Url,
	token_endpoint: Url,
	transport: ReqwestTransport,
}
impl OauthApp {
	/// Creates an app for `client_id` redirecting to `redirect_uri`, using Asana's endpoints.
	pub fn new(client_id: impl Into<String>, redirect_uri: &str) -> Result<Self> {
		let redirect_uri =
			Url::parse(redirect_uri).map_err(|source| ConfigError::InvalidRedirect { source })?;

		Ok(Self {
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri,
			authorize_endpoint: parse_endpoint(ASANA_AUTHORIZE_URL)?,
			token_endpoint: parse_endpoint(ASANA_TOKEN_URL)?,
			transport: ReqwestTransport::default(),
		})
	}

	/// Creates an app for native clients using [`NATIVE_REDIRECT_URI`].
	pub fn native(client_id: impl Into<String>) -> Result<Self> {
		Self::new(client_id, NATIVE_REDIRECT_URI)
	}

	/// Sets the client secret for confidential apps.
	pub fn with_client_secret(mut self, secret: impl Into<Secret>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Overrides the authorization and token endpoints.
	pub fn with_endpoints(mut self, authorize: &str, token: &str) -> Result<Self> {
		self.authorize_endpoint = parse_endpoint(authorize)?;
		self.token_endpoint = parse_endpoint(token)?;

		Ok(self)
	}

	/// Sends token requests through `transport` instead of a default reqwest client.
	///
	/// Token endpoints answer directly, so the wrapped client should not follow redirects.
	pub fn with_transport(mut self, transport: ReqwestTransport) -> Self {
		self.transport = transport;

		self
	}

	/// OAuth client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Redirect URI registered for the app.
	pub fn redirect_uri(&self) -> &Url {
		&self.redirect_uri
	}

	/// Starts a consent flow with a fresh `state` and PKCE pair.
	pub fn authorization_session(&self, scope: Option<&str>) -> AuthorizationSession {
		AuthorizationSession::generate(AuthorizationRequest {
			authorize_endpoint: &self.authorize_endpoint,
			client_id: &self.client_id,
			redirect_uri: &self.redirect_uri,
			scope,
		})
	}

	/// Builds an [`OauthAuthenticator`] holding `credentials` and refreshing through this app.
	pub fn authenticator(self: Arc<Self>, credentials: OauthCredentials) -> OauthAuthenticator {
		OauthAuthenticator::new(credentials).with_refresher(self)
	}

	/// Exchanges an authorization code for credentials.
	///
	/// Pass the session's [`AuthorizationSession::pkce_verifier`] when the code came from
	/// [`OauthApp::authorization_session`].
	pub async fn exchange_code(
		&self,
		code: &str,
		pkce_verifier: Option<&Secret>,
	) -> Result<OauthCredentials> {
		OpSpan::new(OpKind::CodeExchange, "exchange_code")
			.run(async move {
				let client = self.oauth_client();
				let handle = self.transport.token_exchange_handle();
				let mut request = client.exchange_code(AuthorizationCode::new(code.to_owned()));

				if let Some(verifier) = pkce_verifier {
					request =
						request.set_pkce_verifier(PkceCodeVerifier::new(verifier.expose().to_owned()));
				}

				let response = request.request_async(&handle).await.map_err(map_request_error)?;

				Ok(map_token_response(response))
			})
			.await
	}

	/// Exchanges a refresh token for new credentials.
	pub async fn refresh_credentials(&self, refresh_token: &Secret) -> Result<OauthCredentials> {
		OpSpan::new(OpKind::TokenRefresh, "refresh_credentials")
			.run(async move {
				let client = self.oauth_client();
				let handle = self.transport.token_exchange_handle();
				let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
				let response = client
					.exchange_refresh_token(&refresh_secret)
					.request_async(&handle)
					.await
					.map_err(map_request_error)?;

				Ok(map_token_response(response))
			})
			.await
	}

	fn oauth_client(&self) -> ConfiguredBasicClient {
		let auth_url = AuthUrl::from_url(self.authorize_endpoint.clone());
		let token_url = TokenUrl::from_url(self.token_endpoint.clone());
		let redirect_url = RedirectUrl::from_url(self.redirect_uri.clone());
		let mut client = BasicClient::new(ClientId::new(self.client_id.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url)
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = &self.client_secret {
			client = client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
		}

		client
	}
}
impl CredentialRefresher for OauthApp {
	fn refresh<'a>(&'a self, refresh_token: &'a Secret) -> RefreshFuture<'a> {
		Box::pin(self.refresh_credentials(refresh_token))
	}
}
impl Debug for OauthApp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OauthApp")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri)
			.field("authorize_endpoint", &self.authorize_endpoint)
			.field("token_endpoint", &self.token_endpoint)
			.finish()
	}
}

fn parse_endpoint(value: &str) -> Result<Url> {
	Url::parse(value).map_err(|source| ConfigError::InvalidEndpoint { source }.into())
}

fn map_token_response(response: FacadeTokenResponse) -> OauthCredentials {
	let expires_at = response.expires_in().and_then(|expires_in| {
		let secs = i64::try_from(expires_in.as_secs()).ok()?;

		OffsetDateTime::now_utc().checked_add(Duration::seconds(secs))
	});

	OauthCredentials {
		access_token: Some(Secret::new(response.access_token().secret().to_owned())),
		refresh_token: response.refresh_token().map(|token| Secret::new(token.secret().to_owned())),
		expires_at,
	}
}

fn map_request_error(err: BasicRequestTokenError<HttpClientError<ReqwestError>>) -> Error {
	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response),
		RequestTokenError::Request(error) => map_transport_error(error),
		RequestTokenError::Parse(source, _body) =>
			CredentialsError::TokenResponseParse { source }.into(),
		RequestTokenError::Other(message) =>
			CredentialsError::TokenEndpoint { message, status: None }.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse) -> Error {
	let reason = response
		.error_description()
		.cloned()
		.unwrap_or_else(|| response.error().as_ref().to_owned());

	match response.error() {
		BasicErrorResponseType::InvalidGrant => CredentialsError::InvalidGrant { reason }.into(),
		BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient =>
			CredentialsError::InvalidClient { reason }.into(),
		_ => CredentialsError::TokenEndpoint { message: reason, status: None }.into(),
	}
}

fn map_transport_error(err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => match inner.status() {
			Some(status) => CredentialsError::TokenEndpoint {
				message: inner.to_string(),
				status: Some(status.as_u16()),
			}
			.into(),
			None => map_reqwest_error(*inner),
		},
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) =>
			CredentialsError::TokenEndpoint { message, status: None }.into(),
		other => CredentialsError::TokenEndpoint { message: other.to_string(), status: None }.into(),
	}
}
