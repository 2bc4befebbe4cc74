//! Storage contracts and built-in store implementations for session credentials.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::CredentialPair};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value backend holding the session's access and refresh tokens.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if present.
	fn get(&self, key: StoreKey) -> StoreFuture<'_, Option<String>>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set(&self, key: StoreKey, value: String) -> StoreFuture<'_, ()>;

	/// Removes every stored credential.
	fn clear(&self) -> StoreFuture<'_, ()>;

	/// Replaces both tokens with the provided pair.
	///
	/// The default writes the keys one after the other; backends that can swap both values in
	/// a single step should override it.
	fn replace<'a>(&'a self, pair: &'a CredentialPair) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.set(StoreKey::AccessToken, pair.access_token.expose().to_owned()).await?;
			self.set(StoreKey::RefreshToken, pair.refresh_token.expose().to_owned()).await
		})
	}
}

/// Keys understood by [`CredentialStore`] backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoreKey {
	/// Access token attached to outbound requests.
	#[serde(rename = "accessToken")]
	AccessToken,
	/// Refresh token exchanged for a new pair.
	#[serde(rename = "refreshToken")]
	RefreshToken,
}
impl StoreKey {
	/// Returns the stable key name used by persistent backends.
	pub const fn as_str(self) -> &'static str {
		match self {
			StoreKey::AccessToken => "accessToken",
			StoreKey::RefreshToken => "refreshToken",
		}
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_keys_serialize_with_wire_names() {
		let payload = serde_json::to_string(&[StoreKey::AccessToken, StoreKey::RefreshToken])
			.expect("Store keys should serialize to JSON.");

		assert_eq!(payload, r#"["accessToken","refreshToken"]"#);
		assert_eq!(StoreKey::RefreshToken.to_string(), "refreshToken");
	}

	#[tokio::test]
	async fn default_replace_writes_both_keys() {
		#[derive(Default)]
		struct KeyValueStore(Mutex<HashMap<StoreKey, String>>);
		impl CredentialStore for KeyValueStore {
			fn get(&self, key: StoreKey) -> StoreFuture<'_, Option<String>> {
				let value = self.0.lock().get(&key).cloned();

				Box::pin(async move { Ok(value) })
			}

			fn set(&self, key: StoreKey, value: String) -> StoreFuture<'_, ()> {
				self.0.lock().insert(key, value);

				Box::pin(async { Ok(()) })
			}

			fn clear(&self) -> StoreFuture<'_, ()> {
				self.0.lock().clear();

				Box::pin(async { Ok(()) })
			}
		}

		let store = KeyValueStore::default();

		store
			.replace(&CredentialPair::new("access-1", "refresh-1"))
			.await
			.expect("Default replace should succeed.");

		assert_eq!(
			store.get(StoreKey::AccessToken).await.expect("Fetch should succeed."),
			Some("access-1".into()),
		);
		assert_eq!(
			store.get(StoreKey::RefreshToken).await.expect("Fetch should succeed."),
			Some("refresh-1".into()),
		);
	}
}
