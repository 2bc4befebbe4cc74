//! Authenticated API client with transparent session renewal.
//!
//! [`ApiClient`] wraps an [`HttpTransport`] with two stages. The outbound stage merges the
//! client's default headers into every request and attaches `Authorization: Bearer <token>`
//! whenever the credential store holds an access token. The inbound stage passes 2xx responses
//! through, hands the first 401 of each request to the refresh coordinator (see
//! [`refresh`](self::refresh)), and surfaces every other status unchanged as
//! [`Error::Status`].

pub mod refresh;
pub mod request;

pub use refresh::RefreshMetrics;
pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	config::ClientConfig,
	error::TransportError,
	http::{HttpResponse, HttpTransport, header},
	navigation::Navigator,
	store::{CredentialStore, StoreError, StoreKey},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
use refresh::RefreshCoordinator;

type DispatchFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + 'a + Send>>;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient>;

/// HTTP client for one application session.
///
/// The client owns the transport, credential store, navigator, and the refresh state machine.
/// Clones share all of them, including the in-flight refresh cycle, so a single session should
/// be represented by one client and its clones. Independent clients never coordinate.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request, including the refresh exchange.
	pub transport: Arc<T>,
	/// Store holding the session's access and refresh tokens.
	pub store: Arc<dyn CredentialStore>,
	/// Navigation hook invoked when the session cannot be renewed.
	pub navigator: Arc<dyn Navigator>,
	/// Base URL and refresh endpoint.
	pub config: ClientConfig,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	default_headers: Arc<RwLock<HeaderMap>>,
	refresh: Arc<RefreshCoordinator>,
	credential_guard: Arc<AsyncMutex<()>>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn CredentialStore>,
		navigator: Arc<dyn Navigator>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let mut default_headers = HeaderMap::new();

		default_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Self {
			transport: transport.into(),
			store,
			navigator,
			config,
			refresh_metrics: Default::default(),
			default_headers: Arc::new(RwLock::new(default_headers)),
			refresh: Default::default(),
			credential_guard: Default::default(),
		}
	}

	/// Adds or replaces a header sent with every request that does not set it explicitly.
	pub fn with_default_header(self, name: HeaderName, value: HeaderValue) -> Self {
		self.default_headers.write().insert(name, value);

		self
	}

	/// Returns a snapshot of the headers merged into every request.
	pub fn default_headers(&self) -> HeaderMap {
		self.default_headers.read().clone()
	}

	/// Returns `true` while a refresh exchange is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.refresh.is_refreshing()
	}

	/// Returns the number of requests currently waiting on the in-flight refresh.
	pub fn pending_waiters(&self) -> usize {
		self.refresh.pending_waiters()
	}

	/// Sends `request` through both stages and resolves with its successful response.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.dispatch(PendingRequest::new(request)).await
	}

	/// Sends a `GET` request for `target`.
	pub async fn get(&self, target: &str) -> Result<ApiResponse> {
		self.send(ApiRequest::get(target)).await
	}

	/// Sends a `DELETE` request for `target`.
	pub async fn delete(&self, target: &str) -> Result<ApiResponse> {
		self.send(ApiRequest::delete(target)).await
	}

	/// Sends a `POST` request with a JSON body.
	pub async fn post_json<B>(&self, target: &str, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(ApiRequest::post(target).json(body)?).await
	}

	/// Sends a `PUT` request with a JSON body.
	pub async fn put_json<B>(&self, target: &str, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(ApiRequest::put(target).json(body)?).await
	}

	/// Sends a `PATCH` request with a JSON body.
	pub async fn patch_json<B>(&self, target: &str, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(ApiRequest::patch(target).json(body)?).await
	}

	/// Starts a session with a credential pair obtained from a login call.
	pub async fn sign_in(&self, pair: &CredentialPair) -> Result<()> {
		let bearer = pair.access_token.bearer()?;

		self.install_credentials(pair, bearer).await?;

		Ok(())
	}

	/// Ends the session locally: clears stored and default credentials without navigating.
	pub async fn sign_out(&self) -> Result<()> {
		self.clear_credentials().await?;

		Ok(())
	}

	/// Outbound stage followed by the transport call.
	///
	/// The bearer token is read from the store on every call and only sent to the base URL's
	/// origin. The default `Authorization` header is never merged on its own, so a store cleared
	/// behind the client's back stops authenticating immediately.
	async fn execute(&self, request: &ApiRequest, url: &Url) -> Result<HttpResponse> {
		let mut headers = request.headers.clone();
		let defaults = self.default_headers.read().clone();

		for (name, value) in defaults.iter() {
			if name != header::AUTHORIZATION && !headers.contains_key(name) {
				headers.insert(name.clone(), value.clone());
			}
		}

		let access_token = if self.config.is_first_party(url) {
			self.store.get(StoreKey::AccessToken).await?
		} else {
			None
		};

		if let Some(access_token) = access_token {
			headers.insert(header::AUTHORIZATION, TokenSecret::new(access_token).bearer()?);
		}

		let mut outgoing = oauth2::http::Request::builder()
			.method(request.method.clone())
			.uri(url.as_str())
			.body(request.body.clone())
			.map_err(crate::error::ConfigError::from)?;

		*outgoing.headers_mut() = headers;

		self.transport
			.execute(outgoing)
			.await
			.map_err(|e| TransportError::network(url.as_str(), e).into())
	}

	/// Full pipeline for one attempt: outbound stage, transport, inbound stage.
	///
	/// Boxed because a replay re-enters the pipeline from inside the inbound stage.
	fn dispatch(&self, pending: PendingRequest) -> DispatchFuture<'_> {
		Box::pin(async move {
			let url = self.config.resolve(&pending.request.target)?;
			let response = self.execute(&pending.request, &url).await?;
			let status = response.status();

			if status.is_success() {
				Ok(response.into())
			} else if status == StatusCode::UNAUTHORIZED
				&& !pending.retried()
				&& self.config.is_first_party(&url)
			{
				self.recover_unauthorized(pending).await
			} else {
				Err(status_error(response))
			}
		})
	}

	/// Resubmits a request that was already claimed for its single replay.
	async fn replay(&self, mut pending: PendingRequest, token: &TokenSecret) -> Result<ApiResponse> {
		pending.request.headers.insert(header::AUTHORIZATION, token.bearer()?);

		self.dispatch(pending).await
	}

	/// Persists `pair` and makes its access token the default outbound credential.
	async fn install_credentials(
		&self,
		pair: &CredentialPair,
		bearer: HeaderValue,
	) -> Result<(), StoreError> {
		let _guard = self.credential_guard.lock().await;

		self.store.replace(pair).await?;
		self.default_headers.write().insert(header::AUTHORIZATION, bearer);

		Ok(())
	}

	/// Drops the default credential and clears the store.
	async fn clear_credentials(&self) -> Result<(), StoreError> {
		let _guard = self.credential_guard.lock().await;

		self.default_headers.write().remove(header::AUTHORIZATION);
		self.store.clear().await
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient> {
	/// Creates a client backed by a default reqwest transport.
	///
	/// Prefer [`ApiClient::with_transport`] with [`ReqwestHttpClient::with_timeout`] in production
	/// so a hung refresh exchange eventually fails.
	pub fn new(
		config: ClientConfig,
		store: Arc<dyn CredentialStore>,
		navigator: Arc<dyn Navigator>,
	) -> Self {
		Self::with_transport(config, store, navigator, ReqwestHttpClient::default())
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			store: Arc::clone(&self.store),
			navigator: Arc::clone(&self.navigator),
			config: self.config.clone(),
			refresh_metrics: Arc::clone(&self.refresh_metrics),
			default_headers: Arc::clone(&self.default_headers),
			refresh: Arc::clone(&self.refresh),
			credential_guard: Arc::clone(&self.credential_guard),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("config", &self.config)
			.field("refreshing", &self.is_refreshing())
			.field("pending_waiters", &self.pending_waiters())
			.finish()
	}
}

fn status_error(response: HttpResponse) -> Error {
	Error::Status { status: response.status(), response: Box::new(response) }
}
