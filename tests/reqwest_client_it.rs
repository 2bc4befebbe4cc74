#![cfg(feature = "reqwest")]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use httpmock::prelude::*;
use serde::Deserialize;
// self
use silent_refresh::{
	auth::CredentialPair,
	client::ApiClient,
	config::ClientConfig,
	error::{Error, RefreshError},
	http::ReqwestHttpClient,
	navigation::{Navigator, NoopNavigator},
	store::{CredentialStore, MemoryStore, StoreKey},
	url::Url,
};

#[derive(Debug, Deserialize, PartialEq)]
struct Category {
	id: u32,
	name: String,
}

fn build_config(server: &MockServer) -> ClientConfig {
	ClientConfig::builder(
		Url::parse(&server.url("/")).expect("Mock server URL should parse successfully."),
	)
	.build()
	.expect("Loopback configuration should validate.")
}

#[tokio::test]
async fn expired_session_is_renewed_and_replayed() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/categories").header("authorization", "Bearer t1");
			then.status(401).body(r#"{"message":"token expired"}"#);
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/categories").header("authorization", "Bearer t2");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"[{"id":1,"name":"Food"},{"id":2,"name":"Rent"}]"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/refresh")
				.header("content-type", "application/json")
				.body(r#"{"refreshToken":"r1"}"#);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"accessToken":"t2","refreshToken":"r2"}"#);
		})
		.await;
	let store = Arc::new(MemoryStore::default());
	let client = ApiClient::new(
		build_config(&server),
		Arc::clone(&store) as Arc<dyn CredentialStore>,
		Arc::new(NoopNavigator),
	);

	client
		.sign_in(&CredentialPair::new("t1", "r1"))
		.await
		.expect("Signing in should persist the credential pair.");

	let categories = client
		.get("/categories")
		.await
		.expect("The request should succeed after a silent refresh.")
		.json::<Vec<Category>>()
		.expect("Category payload should decode.");

	assert_eq!(categories.len(), 2);
	assert_eq!(categories[1], Category { id: 2, name: "Rent".into() });
	assert_eq!(store.peek(StoreKey::AccessToken).as_deref(), Some("t2"));
	assert_eq!(store.peek(StoreKey::RefreshToken).as_deref(), Some("r2"));

	stale.assert_async().await;
	fresh.assert_async().await;
	refresh.assert_async().await;
}

#[tokio::test]
async fn rejected_refresh_clears_the_session() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(POST).path("/transactions");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(401).body(r#"{"message":"refresh token revoked"}"#);
		})
		.await;
	let store = Arc::new(MemoryStore::default());
	let redirects = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&redirects);
	let navigator: Arc<dyn Navigator> = Arc::new(move || {
		counter.fetch_add(1, Ordering::SeqCst);
	});
	let client = ApiClient::with_transport(
		build_config(&server),
		Arc::clone(&store) as Arc<dyn CredentialStore>,
		navigator,
		ReqwestHttpClient::with_timeout(std::time::Duration::from_secs(5))
			.expect("Reqwest client with timeout should build."),
	);

	client
		.sign_in(&CredentialPair::new("t1", "r1"))
		.await
		.expect("Signing in should persist the credential pair.");

	let err = client
		.post_json("/transactions", &serde_json::json!({ "amount": 42 }))
		.await
		.expect_err("A revoked session should fail the request.");

	let Error::Refresh(RefreshError::Rejected { status, body }) = &err else {
		panic!("Expected a rejected refresh, got {err:?}.");
	};

	assert_eq!(*status, 401);
	assert!(body.contains("revoked"));
	assert!(store.is_empty());
	assert_eq!(redirects.load(Ordering::SeqCst), 1);

	stale.assert_async().await;
	refresh.assert_async().await;
}

#[tokio::test]
async fn retry_after_is_exposed_on_rate_limited_responses() {
	let server = MockServer::start_async().await;
	let limited = server
		.mock_async(|when, then| {
			when.method(GET).path("/reports");
			then.status(429).header("retry-after", "30");
		})
		.await;
	let client = ApiClient::new(
		build_config(&server),
		Arc::new(MemoryStore::default()),
		Arc::new(NoopNavigator),
	);
	let err = client.get("/reports").await.expect_err("429 should surface unchanged.");

	assert_eq!(err.status().map(|status| status.as_u16()), Some(429));
	assert_eq!(err.retry_after(), Some(time::Duration::seconds(30)));

	limited.assert_async().await;
}
