//! Navigation hook invoked when the session cannot be renewed.

// self
use crate::_prelude::*;

/// Capability that sends the user back to the login screen.
///
/// The client calls [`Navigator::redirect_to_login`] exactly once per failed refresh cycle, after
/// stored credentials have been cleared. Implementations must not block.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Navigates to the login entry point.
	fn redirect_to_login(&self);
}
impl<F> Navigator for F
where
	F: Fn() + Send + Sync,
{
	fn redirect_to_login(&self) {
		self()
	}
}

/// Navigator for headless callers (CLIs, background jobs) that only need the error.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl Navigator for NoopNavigator {
	fn redirect_to_login(&self) {}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicBool, Ordering};
	// self
	use super::*;

	#[test]
	fn closures_act_as_navigators() {
		let fired = Arc::new(AtomicBool::new(false));
		let flag = fired.clone();
		let navigator: Arc<dyn Navigator> = Arc::new(move || flag.store(true, Ordering::SeqCst));

		navigator.redirect_to_login();

		assert!(fired.load(Ordering::SeqCst));
	}
}
