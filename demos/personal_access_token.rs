//! Fetches the current user and their workspaces with a personal access token.
//!
//! Set `ASANA_ACCESS_TOKEN` before running.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::{Result, eyre::WrapErr};
use serde::Deserialize;
// self
use asana_client::{
	auth::BasicAuthenticator,
	dispatcher::{Dispatcher, DispatcherConfig, decode},
	request::{DispatchOptions, Query},
};

#[derive(Debug, Deserialize)]
struct Workspace {
	gid: String,
	name: String,
}

#[derive(Debug, Deserialize)]
struct User {
	gid: String,
	name: String,
	workspaces: Vec<Workspace>,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let token = env::var("ASANA_ACCESS_TOKEN").wrap_err("ASANA_ACCESS_TOKEN must be set.")?;
	let dispatcher = Dispatcher::new(
		DispatcherConfig::default().with_authenticator(Arc::new(BasicAuthenticator::new(token))),
	);
	let mut query = Query::new();

	query.insert("opt_fields".into(), "name,workspaces.name".into());

	let me: User =
		decode(dispatcher.get("/users/me", Some(query), DispatchOptions::default()).await?)?;

	println!("Signed in as {} ({}).", me.name, me.gid);

	for workspace in me.workspaces {
		println!("Workspace {} ({}).", workspace.name, workspace.gid);
	}

	Ok(())
}
