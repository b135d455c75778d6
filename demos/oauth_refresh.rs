//! Starts an OAuth consent flow, exchanges the pasted code, and calls the API with a bearer
//! token that refreshes itself.
//!
//! Set `ASANA_CLIENT_ID` and, for confidential apps, `ASANA_CLIENT_SECRET`.

// std
use std::{env, io, sync::Arc};
// crates.io
use color_eyre::{Result, eyre::WrapErr};
// self
use asana_client::{
	dispatcher::{Dispatcher, DispatcherConfig},
	oauth::OauthApp,
	request::DispatchOptions,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let mut app = OauthApp::native(
		env::var("ASANA_CLIENT_ID").wrap_err("ASANA_CLIENT_ID must be set.")?,
	)?;

	if let Ok(secret) = env::var("ASANA_CLIENT_SECRET") {
		app = app.with_client_secret(secret);
	}

	let session = app.authorization_session(Some("default"));

	println!("Open {} and paste the code shown after approval:", &session.authorize_url);

	let mut code = String::new();

	io::stdin().read_line(&mut code)?;

	let credentials = app.exchange_code(code.trim(), Some(session.pkce_verifier())).await?;
	let app = Arc::new(app);
	let authenticator = Arc::new(app.authenticator(credentials));
	let dispatcher = Dispatcher::new(
		DispatcherConfig::default().with_authenticator(authenticator.clone()),
	);

	// Refreshes only when the access token is missing or about to expire.
	dispatcher.authorize().await?;

	let me = dispatcher.get("/users/me", None, DispatchOptions::default()).await?;

	println!("Signed in as {}.", me["name"]);
	println!("Token expires at {:?}.", authenticator.credentials().expires_at);

	Ok(())
}
