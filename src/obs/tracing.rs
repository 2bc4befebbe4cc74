// self
use crate::{_prelude::*, obs::RefreshOutcome};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRefresh<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRefresh<F> = F;

/// A span builder used around refresh exchanges and replays.
#[derive(Clone, Debug)]
pub struct RefreshSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RefreshSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("silent_refresh.refresh", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRefresh<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a structured event describing a refresh state change.
///
/// `waiters` counts the queued requests released by the cycle (or, for
/// [`RefreshOutcome::Queued`], the queue length after enqueueing). Failures are logged at `warn`.
pub fn trace_refresh_outcome(outcome: RefreshOutcome, waiters: usize, error: Option<&dyn Display>) {
	#[cfg(feature = "tracing")]
	{
		match error {
			Some(error) =>
				tracing::warn!(outcome = outcome.as_str(), waiters, %error, "refresh settled"),
			None => tracing::debug!(outcome = outcome.as_str(), waiters, "refresh state changed"),
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, waiters, error);
	}
}

/// Emits a warning for a cleanup step that failed without changing the request outcome.
pub fn trace_cleanup_failure(action: &'static str, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(action, %error, "session cleanup step failed");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (action, error);
	}
}
