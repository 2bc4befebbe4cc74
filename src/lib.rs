//! Bearer-token HTTP client that silently refreshes expired sessions.
//!
//! At most one refresh exchange runs per client. Requests that fail with 401 while it runs are
//! held and replayed with the renewed token, and a failed refresh ends the session.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod navigation;
pub mod obs;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		client::ApiClient,
		config::ClientConfig,
		http::HttpTransport,
		navigation::Navigator,
		store::{CredentialStore, MemoryStore},
	};

	/// Base URL used by fixtures that never touch the network.
	pub const TEST_BASE_URL: &str = "https://api.test.invalid/";

	/// Navigator that counts how many times the client asked for a login redirect.
	#[derive(Debug, Default)]
	pub struct CountingNavigator(AtomicUsize);
	impl CountingNavigator {
		/// Returns the number of recorded redirects.
		pub fn redirects(&self) -> usize {
			self.0.load(Ordering::SeqCst)
		}
	}
	impl Navigator for CountingNavigator {
		fn redirect_to_login(&self) {
			self.0.fetch_add(1, Ordering::SeqCst);
		}
	}

	/// Builds a [`ClientConfig`] pointing at `base_url`.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder(
			Url::parse(base_url).expect("Test base URL fixture should parse successfully."),
		)
		.build()
		.expect("Test client configuration should validate successfully.")
	}

	/// Constructs an [`ApiClient`] backed by an in-memory store and a counting navigator.
	pub fn build_test_client<T>(
		config: ClientConfig,
		transport: T,
	) -> (ApiClient<T>, Arc<MemoryStore>, Arc<CountingNavigator>)
	where
		T: HttpTransport,
	{
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let navigator = Arc::new(CountingNavigator::default());
		let navigation: Arc<dyn Navigator> = navigator.clone();
		let client = ApiClient::with_transport(config, store, navigation, transport);

		(client, store_backend, navigator)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use oauth2::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
