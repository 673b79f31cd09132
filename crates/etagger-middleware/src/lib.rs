//! Response fingerprinting middleware.
//!
//! [`ETagMiddleware`] runs once per request, after the handler has produced
//! a response and before it is transmitted. Eligible responses get an
//! `ETag` header computed from their content; structured bodies are hashed
//! over a canonical, key-order independent JSON form, so `{"a":1,"b":2}` and
//! `{"b":2,"a":1}` carry the same tag. Matching `If-None-Match` requests
//! are answered by [`ConditionalGetMiddleware`].
//!
//! ```rust
//! use etagger_http::{Handler, MiddlewareChain, Request, Response, Result};
//! use etagger_middleware::{ConditionalGetMiddleware, ETagMiddleware};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct Resource;
//!
//! #[async_trait::async_trait]
//! impl Handler for Resource {
//!     async fn handle(&self, _request: Request) -> Result<Response> {
//!         Response::ok().with_json(&json!({"b": 2, "a": 1}))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let etag = ETagMiddleware::from_value(json!({"enabled": true})).unwrap();
//! let chain = etag.register(
//!     MiddlewareChain::new(Arc::new(Resource))
//!         .with_middleware(Arc::new(ConditionalGetMiddleware::new())),
//! );
//!
//! let response = chain.handle(Request::builder().uri("/").build().unwrap()).await.unwrap();
//! assert!(response.etag().is_some());
//! assert_eq!(response.payload().unwrap(), r#"{"a":1,"b":2}"#);
//! # });
//! ```

pub mod canonical;
pub mod conditional;
pub mod digest;
pub mod etag;
pub mod options;
pub mod policy;
pub mod tagger;

pub use canonical::{canonicalize, project};
pub use conditional::ConditionalGetMiddleware;
pub use digest::{Digester, Sha256Base64, Sha256Hex128};
pub use etag::ETagMiddleware;
pub use options::{TagOptions, TagOptionsOverride};
pub use policy::{Eligibility, is_eligible};
pub use tagger::ETagger;

/// Namespace of this plugin's per-route settings.
pub const PLUGIN_NAME: &str = "etagger";

/// Version reported by the plugin.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");
