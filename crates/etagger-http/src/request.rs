//! Incoming request and the route settings attached to it.

use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri, Version};
use serde_json::Value;
use std::collections::HashMap;

use crate::{Error, Extensions, Result};

/// Per-route settings, keyed by plugin name.
///
/// The router stores one of these in [`Request::extensions`] for the
/// matched route. Each plugin reads only its own namespace.
///
/// # Examples
///
/// ```
/// use etagger_http::RouteSettings;
/// use serde_json::json;
///
/// let settings = RouteSettings::new().with_plugin("etagger", json!({"enabled": true}));
/// assert_eq!(settings.plugin("etagger"), Some(&json!({"enabled": true})));
/// assert_eq!(settings.plugin("other"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSettings {
	plugins: HashMap<String, Value>,
}

impl RouteSettings {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the raw settings value for `name`.
	pub fn with_plugin(mut self, name: impl Into<String>, value: Value) -> Self {
		self.plugins.insert(name.into(), value);
		self
	}

	/// Raw settings value for `name`, if the route declares one.
	pub fn plugin(&self, name: &str) -> Option<&Value> {
		self.plugins.get(name)
	}
}

/// HTTP request representation
#[derive(Debug)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub extensions: Extensions,
}

impl Request {
	/// Create a request from its parts
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			extensions: Extensions::new(),
		}
	}

	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use etagger_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/users?page=2")
	///     .header("If-None-Match", "\"abc\"")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/users");
	/// assert_eq!(request.headers.get("if-none-match").unwrap(), "\"abc\"");
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Settings of the route this request was matched to.
	pub fn route_settings(&self) -> Option<RouteSettings> {
		self.extensions.get::<RouteSettings>()
	}
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Method,
	uri: Option<String>,
	version: Version,
	headers: HeaderMap,
	pending_headers: Vec<(String, String)>,
	body: Bytes,
	route: Option<RouteSettings>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Add a header; name and value are validated in [`build`](Self::build).
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.pending_headers.push((name.into(), value.into()));
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Attach the matched route's settings.
	pub fn route(mut self, settings: RouteSettings) -> Self {
		self.route = Some(settings);
		self
	}

	/// Build the request
	///
	/// # Errors
	///
	/// Returns [`Error::Http`] when the URI or a header is malformed.
	pub fn build(self) -> Result<Request> {
		let uri = match self.uri {
			Some(uri) => uri
				.parse::<Uri>()
				.map_err(|e| Error::Http(format!("invalid uri `{}`: {}", uri, e)))?,
			None => Uri::from_static("/"),
		};

		let mut headers = self.headers;
		for (name, value) in self.pending_headers {
			let header_name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|e| Error::Http(format!("invalid header name `{}`: {}", name, e)))?;
			let header_value = HeaderValue::from_str(&value)
				.map_err(|e| Error::Http(format!("invalid value for `{}`: {}", name, e)))?;
			headers.append(header_name, header_value);
		}

		let request = Request::new(self.method, uri, self.version, headers, self.body);
		if let Some(route) = self.route {
			request.extensions.insert(route);
		}
		Ok(request)
	}
}
