use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, ETAG, HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

/// A failure object produced by a handler.
///
/// Responses carrying a failure are transmitted as `{"error": message}`
/// and are never fingerprinted.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
	pub message: String,
	pub data: Option<Value>,
}

impl Failure {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			data: None,
		}
	}

	pub fn with_data(mut self, data: Value) -> Self {
		self.data = Some(data);
		self
	}
}

/// Body of a response as produced by the handler
///
/// New kinds may be added; code outside this crate has to handle
/// unknown variants with a fallback arm.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseBody {
	/// No payload.
	#[default]
	Empty,
	/// Text payload, transmitted verbatim.
	Text(String),
	/// Structured value, serialized to JSON at transmission.
	Json(Value),
	/// Raw bytes, transmitted verbatim.
	Bytes(Bytes),
	/// Error object returned in place of a regular body.
	Failure(Failure),
}

impl ResponseBody {
	/// Short name of the body kind, for logs.
	pub fn kind(&self) -> &'static str {
		match self {
			ResponseBody::Empty => "empty",
			ResponseBody::Text(_) => "text",
			ResponseBody::Json(_) => "json",
			ResponseBody::Bytes(_) => "bytes",
			ResponseBody::Failure(_) => "failure",
		}
	}

	pub fn is_failure(&self) -> bool {
		matches!(self, ResponseBody::Failure(_))
	}
}

impl From<&'static str> for ResponseBody {
	fn from(text: &'static str) -> Self {
		ResponseBody::Text(text.to_string())
	}
}

impl From<String> for ResponseBody {
	fn from(text: String) -> Self {
		ResponseBody::Text(text)
	}
}

impl From<Bytes> for ResponseBody {
	fn from(bytes: Bytes) -> Self {
		ResponseBody::Bytes(bytes)
	}
}

impl From<Vec<u8>> for ResponseBody {
	fn from(bytes: Vec<u8>) -> Self {
		ResponseBody::Bytes(Bytes::from(bytes))
	}
}

impl From<&'static [u8]> for ResponseBody {
	fn from(bytes: &'static [u8]) -> Self {
		ResponseBody::Bytes(Bytes::from_static(bytes))
	}
}

impl From<Value> for ResponseBody {
	fn from(value: Value) -> Self {
		ResponseBody::Json(value)
	}
}

impl From<Failure> for ResponseBody {
	fn from(failure: Failure) -> Self {
		ResponseBody::Failure(failure)
	}
}

/// Indentation used when a structured body is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indent {
	/// Indent each level with this many spaces.
	Spaces(usize),
	/// Indent each level with this literal string.
	Text(String),
}

impl Indent {
	/// Longest indent written per level, in spaces or characters.
	pub const MAX_WIDTH: usize = 10;

	/// Bytes written per nesting level, capped at [`MAX_WIDTH`](Self::MAX_WIDTH).
	/// Empty means compact output.
	pub fn as_bytes(&self) -> Vec<u8> {
		match self {
			Indent::Spaces(n) => vec![b' '; (*n).min(Self::MAX_WIDTH)],
			Indent::Text(text) => text
				.chars()
				.take(Self::MAX_WIDTH)
				.collect::<String>()
				.into_bytes(),
		}
	}
}

/// JSON serialization settings of a response.
///
/// `allowlist` keeps only the listed top-level keys of an object body.
/// `indent` changes whitespace only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringifySettings {
	pub allowlist: Option<Vec<String>>,
	pub indent: Option<Indent>,
}

impl StringifySettings {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_allowlist<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.allowlist = Some(keys.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_indent(mut self, indent: Indent) -> Self {
		self.indent = Some(indent);
		self
	}
}

/// HTTP Response representation
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: ResponseBody,
	pub stringify: StringifySettings,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use etagger_http::{Response, ResponseBody};
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert_eq!(response.body, ResponseBody::Empty);
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: ResponseBody::Empty,
			stringify: StringifySettings::default(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn not_modified() -> Self {
		Self::new(StatusCode::NOT_MODIFIED)
	}

	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Response carrying a failure object instead of a regular body
	///
	/// # Examples
	///
	/// ```
	/// use etagger_http::{Failure, Response};
	/// use hyper::StatusCode;
	///
	/// let response = Response::failure(StatusCode::IM_A_TEAPOT, Failure::new("xyz"));
	/// assert!(response.body.is_failure());
	/// assert_eq!(response.payload().unwrap(), r#"{"error":"xyz"}"#);
	/// ```
	pub fn failure(status: StatusCode, failure: Failure) -> Self {
		Self::new(status).with_body(failure)
	}

	/// Set the response body
	///
	/// # Examples
	///
	/// ```
	/// use etagger_http::{Response, ResponseBody};
	/// use bytes::Bytes;
	///
	/// let response = Response::ok().with_body("Hello, World!");
	/// assert_eq!(response.body, ResponseBody::Text("Hello, World!".to_string()));
	///
	/// let response = Response::ok().with_body(Bytes::from_static(&[1, 2, 3]));
	/// assert_eq!(response.body, ResponseBody::Bytes(Bytes::from_static(&[1, 2, 3])));
	/// ```
	pub fn with_body(mut self, body: impl Into<ResponseBody>) -> Self {
		self.body = body.into();
		self
	}

	/// Set a structured body from any serializable value
	///
	/// The value is kept structured until transmission so post-handler
	/// hooks can still inspect it.
	///
	/// # Examples
	///
	/// ```
	/// use etagger_http::{Response, ResponseBody};
	/// use serde_json::json;
	///
	/// let response = Response::ok().with_json(&json!({"b": 2, "a": 1})).unwrap();
	/// assert_eq!(response.body, ResponseBody::Json(json!({"a": 1, "b": 2})));
	/// ```
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
		let value = serde_json::to_value(data)?;
		self.body = ResponseBody::Json(value);
		Ok(self)
	}

	/// Add a custom header to the response
	///
	/// Invalid names or values are ignored.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(header_name), Ok(header_value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(header_name, header_value);
		}
		self
	}

	pub fn with_stringify(mut self, settings: StringifySettings) -> Self {
		self.stringify = settings;
		self
	}

	/// Current `ETag` header value, quotes included.
	pub fn etag(&self) -> Option<&str> {
		self.headers.get(ETAG).and_then(|v| v.to_str().ok())
	}

	/// Set the `ETag` header to the strong entity tag for `token`
	///
	/// # Errors
	///
	/// Returns [`Error::Http`] when `token` cannot appear in a header value.
	///
	/// # Examples
	///
	/// ```
	/// use etagger_http::Response;
	///
	/// let mut response = Response::ok();
	/// response.set_etag("abc").unwrap();
	/// assert_eq!(response.etag(), Some("\"abc\""));
	/// ```
	pub fn set_etag(&mut self, token: &str) -> Result<()> {
		if token.contains('"') {
			return Err(Error::Http(format!(
				"entity tag must not contain quotes: {}",
				token
			)));
		}
		let value = HeaderValue::from_str(&format!("\"{}\"", token))
			.map_err(|e| Error::Http(format!("invalid entity tag `{}`: {}", token, e)))?;
		self.headers.insert(ETAG, value);
		Ok(())
	}

	/// Set the `Content-Type` header
	pub fn set_content_type(&mut self, media_type: &'static str) {
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static(media_type));
	}

	/// Bytes written to the wire for this body.
	///
	/// Structured bodies that were not rewritten by a hook keep the key
	/// order the handler built them with.
	pub fn payload(&self) -> Result<Bytes> {
		let bytes = match &self.body {
			ResponseBody::Empty => Bytes::new(),
			ResponseBody::Text(text) => Bytes::from(text.clone()),
			ResponseBody::Bytes(bytes) => bytes.clone(),
			ResponseBody::Json(value) => Bytes::from(serde_json::to_vec(value)?),
			ResponseBody::Failure(failure) => {
				let body = serde_json::json!({ "error": failure.message });
				Bytes::from(serde_json::to_vec(&body)?)
			}
		};
		Ok(bytes)
	}
}

impl From<Error> for Response {
	fn from(error: Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		Response::failure(status, Failure::new(error.to_string()))
	}
}
