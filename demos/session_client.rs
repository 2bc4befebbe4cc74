//! Demonstrates a session whose access token expires mid-flight: two concurrent requests hit a
//! 401, one refresh renews the pair, and both requests are replayed with the new token.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use silent_refresh::{
	auth::CredentialPair,
	client::ApiClient,
	config::ClientConfig,
	http::ReqwestHttpClient,
	navigation::Navigator,
	store::{CredentialStore, MemoryStore},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.header("authorization", "Bearer expired-access");
			then.status(401).body("{\"message\":\"token expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).header("content-type", "application/json").body(
				"{\"accessToken\":\"renewed-access\",\"refreshToken\":\"renewed-refresh\"}",
			);
		})
		.await;
	let categories = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/categories").header("authorization", "Bearer renewed-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":1,\"name\":\"Groceries\"}]");
		})
		.await;
	let balance = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/balance").header("authorization", "Bearer renewed-access");
			then.status(200).header("content-type", "application/json").body("{\"total\":1250}");
		})
		.await;
	let config = ClientConfig::builder(Url::parse(&server.url("/api"))?).build()?;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let navigator: Arc<dyn Navigator> = Arc::new(|| println!("Session ended; showing the login screen."));
	let client = ApiClient::with_transport(
		config,
		store,
		navigator,
		ReqwestHttpClient::with_timeout(Duration::from_secs(10))?,
	);

	client.sign_in(&CredentialPair::new("expired-access", "refresh-1")).await?;

	let (categories_response, balance_response) =
		tokio::join!(client.get("/categories"), client.get("/balance"));

	println!("Categories: {}.", categories_response?.text());
	println!("Balance: {}.", balance_response?.text());
	println!(
		"Refresh attempts: {}, queued requests: {}, replays: {}.",
		client.refresh_metrics.attempts(),
		client.refresh_metrics.queued(),
		client.refresh_metrics.replays(),
	);

	categories.assert_async().await;
	balance.assert_async().await;

	println!(
		"Rejected calls before renewal: {}, refresh calls: {}.",
		stale.calls_async().await,
		refresh.calls_async().await,
	);

	Ok(())
}
