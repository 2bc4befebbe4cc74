//! Validated client configuration: API base URL and refresh endpoint.

// self
use crate::{_prelude::*, error::ConfigError};

/// Errors raised while constructing or validating a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} URL must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which URL failed validation.
		endpoint: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// The base URL cannot have paths joined onto it (e.g., `mailto:` or `data:` URLs).
	#[error("The base URL cannot carry request paths: {url}.")]
	CannotBeABase {
		/// URL that failed validation.
		url: String,
	},
	/// Refresh path could not be joined onto the base URL.
	#[error("Refresh path `{path}` is invalid.")]
	InvalidRefreshPath {
		/// Path that failed to resolve.
		path: String,
	},
}

/// Immutable configuration consumed by [`ApiClient`](crate::client::ApiClient).
///
/// Deserialization goes through [`ClientConfigBuilder::build`], so a configuration loaded from a
/// file is normalized and validated exactly like one built in code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ClientConfigFile", into = "ClientConfigFile")]
pub struct ClientConfig {
	/// Base URL every relative request path is resolved against; always ends with `/`.
	pub base_url: Url,
	/// Endpoint receiving `POST {"refreshToken": ...}` during a refresh exchange.
	pub refresh_endpoint: Url,
}
impl ClientConfig {
	/// Path of the refresh endpoint relative to the base URL.
	pub const DEFAULT_REFRESH_PATH: &'static str = "auth/refresh";

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Resolves a request target against the base URL.
	///
	/// Absolute URLs are returned verbatim. Relative targets are joined below the base path, so a
	/// leading `/` does not discard a base path prefix such as `/api/v1/`.
	pub fn resolve(&self, target: &str) -> Result<Url, ConfigError> {
		let invalid = |source| ConfigError::InvalidTarget { target: target.to_owned(), source };

		match Url::parse(target) {
			Ok(url) => Ok(url),
			Err(url::ParseError::RelativeUrlWithoutBase) =>
				self.base_url.join(target.trim_start_matches('/')).map_err(invalid),
			Err(e) => Err(invalid(e)),
		}
	}

	/// Returns `true` when `url` shares the base URL's scheme, host, and port.
	///
	/// Only these requests carry the session's bearer token or trigger a refresh on 401.
	pub fn is_first_party(&self, url: &Url) -> bool {
		url.origin() == self.base_url.origin()
	}
}
impl TryFrom<ClientConfigFile> for ClientConfig {
	type Error = ClientConfigError;

	fn try_from(file: ClientConfigFile) -> Result<Self, Self::Error> {
		ClientConfig::builder(file.base_url).refresh_path(file.refresh_path).build()
	}
}

/// Serialized shape of [`ClientConfig`].
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ClientConfigFile {
	base_url: Url,
	#[serde(default = "default_refresh_path")]
	refresh_path: String,
}
impl From<ClientConfig> for ClientConfigFile {
	fn from(config: ClientConfig) -> Self {
		Self { base_url: config.base_url, refresh_path: config.refresh_endpoint.into() }
	}
}

fn default_refresh_path() -> String {
	ClientConfig::DEFAULT_REFRESH_PATH.into()
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL for relative request paths.
	pub base_url: Url,
	/// Refresh endpoint path, relative to the base URL.
	pub refresh_path: String,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self { base_url, refresh_path: ClientConfig::DEFAULT_REFRESH_PATH.into() }
	}

	/// Overrides the refresh endpoint path (defaults to `auth/refresh`).
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let mut base_url = self.base_url;

		if base_url.cannot_be_a_base() {
			return Err(ClientConfigError::CannotBeABase { url: base_url.to_string() });
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		validate_endpoint("base", &base_url)?;

		let refresh_endpoint = base_url
			.join(self.refresh_path.trim_start_matches('/'))
			.map_err(|_| ClientConfigError::InvalidRefreshPath { path: self.refresh_path.clone() })?;

		validate_endpoint("refresh", &refresh_endpoint)?;

		Ok(ClientConfig { base_url, refresh_endpoint })
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ClientConfigError> {
	let loopback = match url.host() {
		Some(url::Host::Domain(domain)) => domain == "localhost",
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	};

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ClientConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse config URL fixture.")
	}

	#[test]
	fn build_normalizes_base_and_derives_refresh_endpoint() {
		let config = ClientConfig::builder(url("https://api.example.com/v1"))
			.build()
			.expect("HTTPS configuration should validate.");

		assert_eq!(config.base_url.as_str(), "https://api.example.com/v1/");
		assert_eq!(config.refresh_endpoint.as_str(), "https://api.example.com/v1/auth/refresh");
	}

	#[test]
	fn custom_refresh_path_is_joined_below_base() {
		let config = ClientConfig::builder(url("https://api.example.com/"))
			.refresh_path("/session/renew")
			.build()
			.expect("Custom refresh path should validate.");

		assert_eq!(config.refresh_endpoint.as_str(), "https://api.example.com/session/renew");
	}

	#[test]
	fn insecure_endpoints_are_rejected_except_loopback() {
		let err = ClientConfig::builder(url("http://api.example.com/"))
			.build()
			.expect_err("Plain HTTP to a remote host should be rejected.");

		assert!(matches!(err, ClientConfigError::InsecureEndpoint { endpoint: "base", .. }));

		ClientConfig::builder(url("http://127.0.0.1:8080/"))
			.build()
			.expect("Loopback IPv4 hosts may use plain HTTP.");
		ClientConfig::builder(url("http://localhost:3000/"))
			.build()
			.expect("Localhost may use plain HTTP.");

		let err = ClientConfig::builder(url("https://api.example.com/"))
			.refresh_path("http://evil.example.com/refresh")
			.build()
			.expect_err("Refresh endpoints must stay on HTTPS.");

		assert!(matches!(err, ClientConfigError::InsecureEndpoint { endpoint: "refresh", .. }));
	}

	#[test]
	fn deserialized_configs_are_validated_and_normalized() {
		let err = serde_json::from_str::<ClientConfig>(
			r#"{"base_url":"http://api.example.com/v1","refresh_path":"auth/refresh"}"#,
		)
		.expect_err("Plain HTTP to a remote host should be rejected when loading.");

		assert!(err.to_string().contains("must use HTTPS"), "Unexpected error {err}.");

		let config = serde_json::from_str::<ClientConfig>(r#"{"base_url":"https://api.example.com/v1"}"#)
			.expect("HTTPS configuration should load.");

		assert_eq!(config.base_url.as_str(), "https://api.example.com/v1/");
		assert_eq!(config.refresh_endpoint.as_str(), "https://api.example.com/v1/auth/refresh");
		assert_eq!(
			config.resolve("/categories").expect("Relative target should resolve.").as_str(),
			"https://api.example.com/v1/categories",
		);

		let saved = serde_json::to_string(&config).expect("Configuration should serialize.");
		let reloaded =
			serde_json::from_str::<ClientConfig>(&saved).expect("Saved configuration should reload.");

		assert_eq!(reloaded, config);
	}

	#[test]
	fn first_party_requires_matching_origin() {
		let config = ClientConfig::builder(url("https://api.example.com/v1/"))
			.build()
			.expect("Configuration fixture should validate.");

		assert!(config.is_first_party(&url("https://api.example.com/v2/reports")));
		assert!(!config.is_first_party(&url("https://cdn.example.com/report.csv")));
		assert!(!config.is_first_party(&url("https://api.example.com:8443/v1/")));
	}

	#[test]
	fn cannot_be_a_base_urls_are_rejected() {
		let err = ClientConfig::builder(url("mailto:ops@example.com"))
			.build()
			.expect_err("Opaque URLs cannot be used as a base.");

		assert!(matches!(err, ClientConfigError::CannotBeABase { .. }));
	}

	#[test]
	fn resolve_keeps_base_prefix_and_absolute_targets() {
		let config = ClientConfig::builder(url("https://api.example.com/v1/"))
			.build()
			.expect("Configuration fixture should validate.");

		assert_eq!(
			config.resolve("/categories").expect("Relative target should resolve.").as_str(),
			"https://api.example.com/v1/categories",
		);
		assert_eq!(
			config.resolve("transactions?page=2").expect("Query target should resolve.").as_str(),
			"https://api.example.com/v1/transactions?page=2",
		);
		assert_eq!(
			config
				.resolve("https://cdn.example.com/report.csv")
				.expect("Absolute target should pass through.")
				.as_str(),
			"https://cdn.example.com/report.csv",
		);
	}
}
