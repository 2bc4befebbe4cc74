//! Request and response descriptors exchanged with [`ApiClient`](crate::client::ApiClient).

// std
use std::borrow::Cow;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{HttpResponse, header},
};

/// Outgoing request descriptor; cheap to clone so it can be replayed after a refresh.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured base URL, or an absolute URL.
	pub target: String,
	/// Headers set by the caller; the client's defaults never override them.
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Vec<u8>,
}
impl ApiRequest {
	/// Creates a request with an empty body.
	pub fn new(method: Method, target: impl Into<String>) -> Self {
		Self { method, target: target.into(), headers: HeaderMap::new(), body: Vec::new() }
	}

	/// Shorthand for a `GET` request.
	pub fn get(target: impl Into<String>) -> Self {
		Self::new(Method::GET, target)
	}

	/// Shorthand for a `POST` request.
	pub fn post(target: impl Into<String>) -> Self {
		Self::new(Method::POST, target)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(target: impl Into<String>) -> Self {
		Self::new(Method::PUT, target)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(target: impl Into<String>) -> Self {
		Self::new(Method::PATCH, target)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(target: impl Into<String>) -> Self {
		Self::new(Method::DELETE, target)
	}

	/// Sets a header, replacing any previous value with the same name.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Replaces the raw body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Encodes `body` as JSON and marks the request accordingly.
	pub fn json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		self.body = serde_json::to_vec(body).map_err(ConfigError::RequestEncode)?;
		self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Returns the `Authorization` header currently attached, if any.
	pub fn authorization(&self) -> Option<&HeaderValue> {
		self.headers.get(header::AUTHORIZATION)
	}
}

/// A request in flight, tracking whether it has already been replayed after a refresh.
#[derive(Clone, Debug)]
pub struct PendingRequest {
	/// Request descriptor sent (and possibly resent) through the transport.
	pub request: ApiRequest,
	retried: bool,
}
impl PendingRequest {
	/// Wraps a request that has not been retried yet.
	pub fn new(request: ApiRequest) -> Self {
		Self { request, retried: false }
	}

	/// Returns `true` once the request has been claimed for a post-refresh replay.
	pub fn retried(&self) -> bool {
		self.retried
	}

	/// Claims the single replay this request is allowed.
	///
	/// Once claimed, a further 401 for this request is surfaced instead of refreshing again.
	pub fn mark_retried(&mut self) {
		self.retried = true;
	}
}

/// Successful response handed back to callers.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// Response status (always 2xx when returned through `Ok`).
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Decodes the body as JSON, reporting the failing field path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);
		let value = serde_path_to_error::deserialize(&mut deserializer).map_err(ConfigError::from)?;

		Ok(value)
	}

	/// Returns the body as UTF-8 text, replacing invalid sequences.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}
}
impl From<HttpResponse> for ApiResponse {
	fn from(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status, headers: parts.headers, body }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize, PartialEq)]
	struct Category {
		id: u32,
		name: String,
	}

	#[test]
	fn marking_retried_is_sticky() {
		let mut pending = PendingRequest::new(ApiRequest::get("/categories"));

		assert!(!pending.retried());

		pending.mark_retried();

		assert!(pending.retried());

		pending.mark_retried();

		assert!(pending.retried());
	}

	#[test]
	fn json_body_sets_content_type() {
		let request = ApiRequest::post("/transactions")
			.json(&serde_json::json!({ "amount": 12.5 }))
			.expect("JSON body fixture should encode.");

		assert_eq!(request.body, br#"{"amount":12.5}"#.to_vec());
		assert_eq!(
			request.headers.get(header::CONTENT_TYPE),
			Some(&HeaderValue::from_static("application/json")),
		);
		assert!(request.authorization().is_none());
	}

	#[test]
	fn response_json_reports_field_path() {
		let response = ApiResponse {
			status: StatusCode::OK,
			headers: HeaderMap::new(),
			body: br#"[{"id":1,"name":"Food"},{"id":"two","name":"Rent"}]"#.to_vec(),
		};
		let err = response
			.json::<Vec<Category>>()
			.expect_err("Mistyped ids should fail to decode.");

		let Error::Config(ConfigError::ResponseDecode(inner)) = &err else {
			panic!("Expected a decode error, got {err:?}.");
		};

		assert_eq!(inner.path().to_string(), "[1].id");

		let ok = ApiResponse { body: br#"{"id":3,"name":"Salary"}"#.to_vec(), ..response };

		assert_eq!(
			ok.json::<Category>().expect("Valid body should decode."),
			Category { id: 3, name: "Salary".into() },
		);
	}
}
