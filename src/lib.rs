//! Dispatch core for the Asana REST API.
//!
//! A [`dispatcher::Dispatcher`] turns a path, query, and body into an authenticated request,
//! sends it over a pluggable [`http::HttpTransport`], and resolves the response envelope into
//! either its `data` payload or a typed [`error::ApiError`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod dispatcher;
pub mod error;
pub mod http;
#[cfg(feature = "reqwest")] pub mod oauth;
pub mod obs;
pub mod request;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use {serde_json, url};
#[cfg(test)] use {color_eyre as _, httpmock as _};
