//! Middleware and handler traits for HTTP request processing.
//!
//! ## Middleware
//!
//! Middleware wraps handlers to add cross-cutting concerns. A post-handler
//! hook calls `next` first and then rewrites the response it gets back:
//!
//! ```rust
//! use etagger_http::{Handler, Middleware, Request, Response, Result};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct PoweredBy;
//!
//! #[async_trait]
//! impl Middleware for PoweredBy {
//!     async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
//!         let response = next.handle(request).await?;
//!         Ok(response.with_header("x-powered-by", "etagger"))
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Produces the response for a request.
///
/// Route handlers implement it, and so does every composed link of a
/// [`MiddlewareChain`].
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		T::handle(self, request).await
	}
}

/// Wraps the rest of a chain.
///
/// `next` is everything inside this middleware, down to the route handler.
/// Returning without calling it short-circuits the request.
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;

	/// Return `false` to leave this middleware out for `request`.
	fn should_continue(&self, _request: &Request) -> bool {
		true
	}
}

/// A handler wrapped in an ordered list of middleware.
///
/// The first middleware added is the outermost one: it sees the request
/// first and the response last.
pub struct MiddlewareChain {
	handler: Arc<dyn Handler>,
	layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			layers: Vec::new(),
		}
	}

	/// Append `middleware` inside the ones already added.
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.add_middleware(middleware);
		self
	}

	pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
		self.layers.push(middleware);
	}

	pub fn len(&self) -> usize {
		self.layers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.layers.is_empty()
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		// built inside out, so the last layer added wraps the handler directly
		let entry = self
			.layers
			.iter()
			.rev()
			.filter(|layer| layer.should_continue(&request))
			.fold(self.handler.clone(), |next, layer| {
				Arc::new(Link {
					layer: layer.clone(),
					next,
				}) as Arc<dyn Handler>
			});

		entry.handle(request).await
	}
}

/// One middleware bound to the rest of the chain.
struct Link {
	layer: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for Link {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.layer.process(request, self.next.clone()).await
	}
}
