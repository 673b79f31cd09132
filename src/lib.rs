//! # etagger
//!
//! Content fingerprinting for HTTP responses.
//!
//! After a handler has produced a response, the ETag middleware computes a
//! fingerprint of its content and attaches it as an `ETag` header, so
//! clients can revalidate with `If-None-Match` and receive
//! `304 Not Modified` when nothing changed.
//!
//! Structured bodies are hashed over a canonical JSON form with object keys
//! sorted, so the same data always yields the same tag regardless of how the
//! handler built it. Byte and text bodies are hashed as-is.
//!
//! ## Crates
//!
//! - [`http`]: request, response, handler and middleware chain types
//! - [`middleware`]: the ETag middleware, the tagger and conditional GET
//!
//! ## Quick Example
//!
//! ```rust
//! use etagger::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct Users;
//!
//! #[async_trait]
//! impl Handler for Users {
//!     async fn handle(&self, _request: Request) -> Result<Response> {
//!         Ok(Response::ok().with_body(json!({"name": "ada", "id": 1})))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let chain = ETagMiddleware::from_value(json!({"enabled": true}))?.register(
//!     MiddlewareChain::new(Arc::new(Users))
//!         .with_middleware(Arc::new(ConditionalGetMiddleware::new())),
//! );
//!
//! let first = chain.handle(Request::builder().uri("/users/1").build()?).await?;
//! let etag = first.etag().unwrap().to_string();
//!
//! let again = Request::builder()
//!     .uri("/users/1")
//!     .header("If-None-Match", etag)
//!     .build()?;
//! let second = chain.handle(again).await?;
//! assert_eq!(second.status, StatusCode::NOT_MODIFIED);
//! # Ok::<(), Error>(())
//! # }).unwrap();
//! ```
//!
//! ## Options
//!
//! | key          | type | default | meaning                                |
//! |--------------|------|---------|----------------------------------------|
//! | `enabled`    | bool | `false` | tag responses automatically            |
//! | `nonSuccess` | bool | `false` | skip responses with a non-2xx status   |
//!
//! Options given at registration are the defaults; routes override them
//! under the `etagger` key of their [`RouteSettings`].

pub use etagger_http as http;
pub use etagger_middleware as middleware;

pub use etagger_http::{
	Error, Extensions, Failure, Handler, Indent, Middleware, MiddlewareChain, Request,
	RequestBuilder, Response, ResponseBody, Result, RouteSettings, StringifySettings,
};
pub use etagger_middleware::{
	ConditionalGetMiddleware, Digester, ETagMiddleware, ETagger, Eligibility, PLUGIN_NAME,
	PLUGIN_VERSION, Sha256Base64, Sha256Hex128, TagOptions, TagOptionsOverride, canonicalize,
	is_eligible,
};

pub use hyper::StatusCode;

/// Commonly used items.
pub mod prelude {
	pub use crate::{
		ConditionalGetMiddleware, ETagMiddleware, ETagger, Error, Failure, Handler, Middleware,
		MiddlewareChain, Request, Response, ResponseBody, Result, RouteSettings, StatusCode,
		StringifySettings, TagOptions,
	};

	pub use async_trait::async_trait;
}
