//! Single-flight credential refresh with waiter fan-out and guaranteed cleanup.
//!
//! The first request to hit a 401 while no refresh is running becomes the cycle's leader: it
//! flips `refreshing`, posts the stored refresh token to the refresh endpoint, and settles the
//! cycle. Every other 401 seen during the cycle enqueues a oneshot waiter and suspends. Settling
//! resets `refreshing` and drains the waiters under one lock, then hands each waiter the same
//! outcome in enqueue order. If the leader's future is dropped before settling, the
//! [`RefreshCycle`] guard settles with [`RefreshError::Abandoned`] so no waiter hangs and a later
//! 401 can start a fresh cycle.

mod metrics;

pub use self::metrics::RefreshMetrics;

// crates.io
use futures::channel::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret, credential::RefreshRequestBody},
	client::{ApiClient, ApiResponse, PendingRequest},
	error::RefreshError,
	http::{HttpTransport, header},
	obs::{self, RefreshOutcome, RefreshSpan},
	store::StoreKey,
};

type Settlement = Result<TokenSecret, RefreshError>;

const BODY_PREVIEW_LIMIT: usize = 256;

#[derive(Debug, Default)]
struct RefreshState {
	refreshing: bool,
	waiters: Vec<oneshot::Sender<Settlement>>,
}

/// Per-client refresh state shared by every clone of an [`ApiClient`].
#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator(Mutex<RefreshState>);
impl RefreshCoordinator {
	/// Joins the running cycle as a waiter, or starts a new cycle as its leader.
	///
	/// The check and the transition happen under one lock, so exactly one caller leads.
	pub(crate) fn enter(self: &Arc<Self>) -> Ticket {
		let mut state = self.0.lock();

		if state.refreshing {
			let (tx, rx) = oneshot::channel();

			state.waiters.push(tx);

			Ticket::Wait { receiver: rx, position: state.waiters.len() }
		} else {
			state.refreshing = true;

			Ticket::Lead(RefreshCycle { coordinator: Arc::clone(self), settled: false })
		}
	}

	pub(crate) fn is_refreshing(&self) -> bool {
		self.0.lock().refreshing
	}

	pub(crate) fn pending_waiters(&self) -> usize {
		self.0.lock().waiters.len()
	}
}

/// Role handed out by [`RefreshCoordinator::enter`].
pub(crate) enum Ticket {
	/// The caller owns the cycle and must settle it.
	Lead(RefreshCycle),
	/// The caller waits for the leader's outcome.
	Wait { receiver: oneshot::Receiver<Settlement>, position: usize },
}

/// Ownership of an in-flight refresh cycle.
pub(crate) struct RefreshCycle {
	coordinator: Arc<RefreshCoordinator>,
	settled: bool,
}
impl RefreshCycle {
	/// Ends the cycle and releases every waiter with `outcome`; returns how many were released.
	pub(crate) fn settle(mut self, outcome: Settlement) -> usize {
		self.release(outcome)
	}

	fn release(&mut self, outcome: Settlement) -> usize {
		self.settled = true;

		let waiters = {
			let mut state = self.coordinator.0.lock();

			state.refreshing = false;

			std::mem::take(&mut state.waiters)
		};
		let released = waiters.len();

		for waiter in waiters {
			// A waiter whose caller gave up has dropped its receiver.
			let _ = waiter.send(outcome.clone());
		}

		released
	}
}
impl Drop for RefreshCycle {
	fn drop(&mut self) {
		if !self.settled {
			let released = self.release(Err(RefreshError::Abandoned));

			obs::trace_refresh_outcome(
				RefreshOutcome::Failure,
				released,
				Some(&RefreshError::Abandoned),
			);
		}
	}
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Inbound stage for a 401: obtains a renewed access token (leading or joining the refresh
	/// cycle) and replays `pending` with it exactly once.
	pub(crate) async fn recover_unauthorized(
		&self,
		mut pending: PendingRequest,
	) -> Result<ApiResponse> {
		pending.mark_retried();

		let token = match self.refresh.enter() {
			Ticket::Lead(cycle) => self.lead_refresh(cycle).await?,
			Ticket::Wait { receiver, position } => {
				self.refresh_metrics.record_queued();
				obs::record_refresh_outcome(RefreshOutcome::Queued);
				obs::trace_refresh_outcome(RefreshOutcome::Queued, position, None);

				receiver.await.unwrap_or(Err(RefreshError::Abandoned))?
			},
		};

		self.refresh_metrics.record_replay();
		self.replay(pending, &token).await
	}

	async fn lead_refresh(&self, cycle: RefreshCycle) -> Result<TokenSecret, RefreshError> {
		let span = RefreshSpan::new("exchange");

		self.refresh_metrics.record_attempt();
		obs::record_refresh_outcome(RefreshOutcome::Attempt);
		obs::trace_refresh_outcome(RefreshOutcome::Attempt, 0, None);

		span.instrument(async move {
			let renewed = match self.exchange().await {
				Ok(pair) => self.install_renewed(&pair).await.map(|()| pair.access_token),
				Err(e) => Err(e),
			};

			match renewed {
				Ok(access_token) => {
					let released = cycle.settle(Ok(access_token.clone()));

					self.refresh_metrics.record_success();
					obs::record_refresh_outcome(RefreshOutcome::Success);
					obs::trace_refresh_outcome(RefreshOutcome::Success, released, None);

					Ok(access_token)
				},
				Err(e) => {
					self.terminate_session().await;

					let released = cycle.settle(Err(e.clone()));

					self.refresh_metrics.record_failure();
					obs::record_refresh_outcome(RefreshOutcome::Failure);
					obs::trace_refresh_outcome(RefreshOutcome::Failure, released, Some(&e));

					Err(e)
				},
			}
		})
		.await
	}

	/// Posts the stored refresh token to the refresh endpoint, bypassing both interceptors.
	async fn exchange(&self) -> Result<CredentialPair, RefreshError> {
		let refresh_token = self
			.store
			.get(StoreKey::RefreshToken)
			.await
			.map_err(|e| RefreshError::Storage { message: e.to_string() })?
			.ok_or(RefreshError::MissingRefreshToken)?;
		let body = serde_json::to_vec(&RefreshRequestBody { refresh_token: &refresh_token })
			.map_err(|e| RefreshError::Transport { message: e.to_string() })?;
		let request = oauth2::http::Request::builder()
			.method(Method::POST)
			.uri(self.config.refresh_endpoint.as_str())
			.header(header::CONTENT_TYPE, "application/json")
			.header(header::ACCEPT, "application/json")
			.body(body)
			.map_err(|e| RefreshError::Transport { message: e.to_string() })?;
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|e| RefreshError::Transport { message: e.to_string() })?;
		let status = response.status();

		if !status.is_success() {
			return Err(RefreshError::Rejected {
				status: status.as_u16(),
				body: body_preview(response.body()),
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| RefreshError::MalformedResponse { message: e.to_string() })
	}

	async fn install_renewed(&self, pair: &CredentialPair) -> Result<(), RefreshError> {
		let bearer = pair.access_token.bearer().map_err(|_| RefreshError::MalformedResponse {
			message: "access token is not a valid header value".into(),
		})?;

		self.install_credentials(pair, bearer)
			.await
			.map_err(|e| RefreshError::Storage { message: e.to_string() })
	}

	/// Purges stored and default credentials, then asks the navigator for the login screen.
	///
	/// Cleanup failures are logged; the session is over either way.
	async fn terminate_session(&self) {
		if let Err(e) = self.clear_credentials().await {
			obs::trace_cleanup_failure("clear_credentials", &e);
		}

		self.navigator.redirect_to_login();
	}
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	match text.char_indices().nth(BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}…", &text[..cut]),
		None => text.into_owned(),
	}
}
