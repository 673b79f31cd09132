//! ETag Middleware
//!
//! Post-handler hook that fingerprints each response once, after the
//! handler returned and before transmission.

use async_trait::async_trait;
use etagger_http::{Handler, Middleware, MiddlewareChain, Request, Response, Result};
use serde_json::Value;
use std::sync::Arc;

use crate::digest::Digester;
use crate::options::{TagOptions, TagOptionsOverride};
use crate::tagger::ETagger;
use crate::{PLUGIN_NAME, PLUGIN_VERSION};

/// ETag middleware
///
/// Reads per-route options from the request's
/// [`RouteSettings`](etagger_http::RouteSettings) under [`PLUGIN_NAME`],
/// merges them over the registration defaults and tags the handler's
/// response. Handler errors pass through untouched.
#[derive(Debug, Clone)]
pub struct ETagMiddleware {
	tagger: Arc<ETagger>,
}

impl ETagMiddleware {
	/// Create the middleware from already validated defaults
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use etagger_http::{Handler, Middleware, Request, Response, Result};
	/// use etagger_middleware::{ETagMiddleware, TagOptions};
	///
	/// struct TestHandler;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for TestHandler {
	///     async fn handle(&self, _request: Request) -> Result<Response> {
	///         Ok(Response::ok().with_body(vec![1u8, 2, 3]))
	///     }
	/// }
	///
	/// # tokio_test::block_on(async {
	/// let middleware = ETagMiddleware::new(TagOptions::new().enabled(true));
	/// let request = Request::builder().uri("/buffer").build().unwrap();
	///
	/// let response = middleware.process(request, Arc::new(TestHandler)).await.unwrap();
	/// assert_eq!(response.etag(), Some("\"A5BYxvLAy0ksUzsKTRTvd8wPeKvMztUofYShogEc+4E=\""));
	/// # });
	/// ```
	pub fn new(defaults: TagOptions) -> Self {
		Self::with_tagger(ETagger::new(defaults))
	}

	pub fn with_tagger(tagger: ETagger) -> Self {
		Self {
			tagger: Arc::new(tagger),
		}
	}

	/// Register with raw options, validated against the options schema.
	///
	/// # Errors
	///
	/// Returns [`Error::Configuration`](etagger_http::Error::Configuration)
	/// on unknown keys or wrong types, so a misconfigured process fails at
	/// startup.
	pub fn from_value(options: Value) -> Result<Self> {
		let overrides = TagOptionsOverride::from_value(options)?;
		let middleware = Self::new(TagOptions::from(overrides));
		tracing::debug!(
			plugin = PLUGIN_NAME,
			version = PLUGIN_VERSION,
			defaults = ?middleware.tagger.defaults(),
			"registered"
		);
		Ok(middleware)
	}

	/// Register with options read from a TOML document.
	///
	/// See [`TagOptionsOverride::from_toml_str`] for the accepted layouts.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		let overrides = TagOptionsOverride::from_toml_str(source)?;
		Ok(Self::new(TagOptions::from(overrides)))
	}

	/// Replace the hashing strategy, keeping the defaults.
	pub fn with_digester(self, digester: impl Digester + 'static) -> Self {
		let tagger = (*self.tagger).clone().with_digester(digester);
		Self::with_tagger(tagger)
	}

	/// Shared handle to the tagger, for application code.
	pub fn tagger(&self) -> Arc<ETagger> {
		self.tagger.clone()
	}

	/// Tag a response assembled by application code, regardless of the
	/// `enabled` option.
	///
	/// `options` is validated like per-route options.
	///
	/// # Examples
	///
	/// ```
	/// use etagger_http::Response;
	/// use etagger_middleware::ETagMiddleware;
	/// use serde_json::json;
	///
	/// let middleware = ETagMiddleware::from_value(json!(null)).unwrap();
	/// let response = middleware.etag(Response::ok().with_body("ab"), None).unwrap();
	/// assert!(response.etag().is_some());
	///
	/// let invalid = json!({"unknown": true});
	/// assert!(middleware.etag(Response::ok(), Some(&invalid)).is_err());
	/// ```
	pub fn etag(&self, response: Response, options: Option<&Value>) -> Result<Response> {
		let overrides = options
			.map(|value| TagOptionsOverride::from_value(value.clone()))
			.transpose()?;
		self.tagger.force_tag(response, overrides.as_ref())
	}

	/// Add this hook to `chain` as its innermost middleware, so it sees the
	/// handler's response before any other middleware does.
	pub fn register(self, chain: MiddlewareChain) -> MiddlewareChain {
		chain.with_middleware(Arc::new(self))
	}

	fn route_options(request: &Request) -> Option<Value> {
		request
			.route_settings()
			.and_then(|settings| settings.plugin(PLUGIN_NAME).cloned())
	}
}

impl Default for ETagMiddleware {
	fn default() -> Self {
		Self::new(TagOptions::default())
	}
}

#[async_trait]
impl Middleware for ETagMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let path = request.path().to_string();
		let route = Self::route_options(&request);

		let response = next.handle(request).await?;

		tracing::trace!(path = %path, status = response.status.as_u16(), "post-handler");
		let route = route
			.map(TagOptionsOverride::from_value)
			.transpose()
			.inspect_err(|error| {
				tracing::warn!(path = %path, %error, "invalid route options");
			})?;
		self.tagger.tag(response, route.as_ref())
	}
}
