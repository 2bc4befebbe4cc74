//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::CredentialPair,
	store::{CredentialStore, StoreError, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, String>>>;

/// Thread-safe storage backend that keeps credentials in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns `true` when no credential is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Returns the stored value for `key` without going through the async contract.
	pub fn peek(&self, key: StoreKey) -> Option<String> {
		self.0.read().get(&key).cloned()
	}

	fn replace_now(map: StoreMap, pair: &CredentialPair) -> Result<(), StoreError> {
		let mut guard = map.write();

		guard.insert(StoreKey::AccessToken, pair.access_token.expose().to_owned());
		guard.insert(StoreKey::RefreshToken, pair.refresh_token.expose().to_owned());

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self, key: StoreKey) -> StoreFuture<'_, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&key).cloned()) })
	}

	fn set(&self, key: StoreKey, value: String) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key, value);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().clear();

			Ok(())
		})
	}

	fn replace<'a>(&'a self, pair: &'a CredentialPair) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::replace_now(map, pair) })
	}
}
