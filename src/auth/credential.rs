//! The access/refresh token pair and the JSON bodies of the refresh exchange.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access and refresh tokens issued together for one session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
	/// Short-lived token attached to every outbound request.
	pub access_token: TokenSecret,
	/// Long-lived token exchanged for a new pair.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Creates a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}
}

/// Body posted to the refresh endpoint.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequestBody<'a> {
	pub(crate) refresh_token: &'a str,
}
