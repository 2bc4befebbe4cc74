//! Credential models: redacted secrets, the stored token pair, and refresh wire types.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
