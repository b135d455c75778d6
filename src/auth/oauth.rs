//! Bearer-token authenticator with single-flight refresh.

// self
use crate::{
	_prelude::*,
	auth::{Authenticator, CredentialsFuture, Secret},
	error::CredentialsError,
	request::{RequestAuth, RequestDescriptor},
};

/// Boxed future returned by [`CredentialRefresher::refresh`].
pub type RefreshFuture<'a> = Pin<Box<dyn Future<Output = Result<OauthCredentials>> + 'a + Send>>;

/// Exchanges a refresh token for a new credential set.
///
/// [`crate::oauth::OauthApp`] implements this against the Asana token endpoint; tests and custom
/// deployments can supply their own.
pub trait CredentialRefresher
where
	Self: 'static + Send + Sync,
{
	/// Performs a `grant_type=refresh_token` exchange.
	fn refresh<'a>(&'a self, refresh_token: &'a Secret) -> RefreshFuture<'a>;
}

/// OAuth credential set held by [`OauthAuthenticator`].
///
/// Serializable so callers can persist tokens between runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OauthCredentials {
	/// Bearer token attached to requests.
	pub access_token: Option<Secret>,
	/// Long-lived token used to mint new access tokens.
	pub refresh_token: Option<Secret>,
	/// Expiry instant of the access token, when the provider reported one.
	pub expires_at: Option<OffsetDateTime>,
}
impl OauthCredentials {
	/// Credentials consisting of a bare access token with no known expiry.
	pub fn from_access_token(token: impl Into<Secret>) -> Self {
		Self { access_token: Some(token.into()), ..Default::default() }
	}

	/// Credentials that only carry a refresh token; the first `ensure_credentials` refreshes.
	pub fn from_refresh_token(token: impl Into<Secret>) -> Self {
		Self { refresh_token: Some(token.into()), ..Default::default() }
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<Secret>) -> Self {
		self.refresh_token = Some(token.into());

		self
	}

	/// Sets the absolute expiry instant.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Returns `true` when an access token is held and stays valid beyond `leeway` after `now`.
	pub fn is_usable_at(&self, now: OffsetDateTime, leeway: Duration) -> bool {
		if self.access_token.is_none() {
			return false;
		}

		match self.expires_at {
			Some(expires_at) =>
				now.checked_add(leeway).is_some_and(|deadline| deadline < expires_at),
			None => true,
		}
	}
}

/// Authenticator that attaches a bearer token and refreshes it on demand.
///
/// Concurrent [`Authenticator::ensure_credentials`] calls share one refresh: the first caller
/// takes an async guard, later callers wait on it and then observe the refreshed credentials.
pub struct OauthAuthenticator {
	credentials: RwLock<OauthCredentials>,
	refresher: Option<Arc<dyn CredentialRefresher>>,
	refresh_guard: AsyncMutex<()>,
	expiry_leeway: Duration,
}
impl OauthAuthenticator {
	const DEFAULT_EXPIRY_LEEWAY: Duration = Duration::seconds(60);

	/// Creates an authenticator holding `credentials` and no refresher.
	pub fn new(credentials: OauthCredentials) -> Self {
		Self {
			credentials: RwLock::new(credentials),
			refresher: None,
			refresh_guard: AsyncMutex::new(()),
			expiry_leeway: Self::DEFAULT_EXPIRY_LEEWAY,
		}
	}

	/// Installs the refresher used when credentials are missing or expiring.
	pub fn with_refresher(mut self, refresher: Arc<dyn CredentialRefresher>) -> Self {
		self.refresher = Some(refresher);

		self
	}

	/// Overrides how long before `expires_at` a token is treated as expired (defaults to 60
	/// seconds).
	pub fn with_expiry_leeway(mut self, leeway: Duration) -> Self {
		self.expiry_leeway = if leeway.is_negative() { Duration::ZERO } else { leeway };

		self
	}

	/// Returns a snapshot of the current credentials.
	pub fn credentials(&self) -> OauthCredentials {
		self.credentials.read().clone()
	}

	/// Replaces the held credentials.
	pub fn set_credentials(&self, credentials: OauthCredentials) {
		*self.credentials.write() = credentials;
	}

	fn is_usable(&self) -> bool {
		self.credentials.read().is_usable_at(OffsetDateTime::now_utc(), self.expiry_leeway)
	}

	async fn refresh_if_needed(&self) -> Result<()> {
		if self.is_usable() {
			return Ok(());
		}

		let _singleflight = self.refresh_guard.lock().await;

		if self.is_usable() {
			return Ok(());
		}

		let refresh_token = self
			.credentials
			.read()
			.refresh_token
			.clone()
			.ok_or(CredentialsError::MissingRefreshToken)?;
		let refresher = self.refresher.as_ref().ok_or(CredentialsError::NoRefresher)?;
		let mut fresh = refresher.refresh(&refresh_token).await?;

		if fresh.refresh_token.is_none() {
			fresh.refresh_token = Some(refresh_token);
		}

		self.set_credentials(fresh);

		Ok(())
	}
}
impl Authenticator for OauthAuthenticator {
	fn authenticate_request(&self, request: &mut RequestDescriptor) {
		if let Some(token) = self.credentials.read().access_token.clone() {
			request.auth = Some(RequestAuth::Bearer(token));
		}
	}

	fn ensure_credentials(&self) -> CredentialsFuture<'_> {
		Box::pin(self.refresh_if_needed())
	}
}
impl Debug for OauthAuthenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OauthAuthenticator")
			.field("credentials", &*self.credentials.read())
			.field("refresher_set", &self.refresher.is_some())
			.field("expiry_leeway", &self.expiry_leeway)
			.finish()
	}
}
