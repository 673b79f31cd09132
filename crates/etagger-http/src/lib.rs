//! HTTP types for the etagger response-tagging hook.
//!
//! This crate models the slice of a web framework that a post-handler
//! extension needs: a [`Request`] carrying per-route settings, a
//! [`Response`] whose body is a closed [`ResponseBody`] variant, and the
//! [`Handler`] / [`Middleware`] pair used to compose a processing pipeline.
//!
//! ## Example
//!
//! ```rust
//! use etagger_http::{Handler, Request, Response, Result};
//! use async_trait::async_trait;
//! use serde_json::json;
//!
//! struct Users;
//!
//! #[async_trait]
//! impl Handler for Users {
//!     async fn handle(&self, _request: Request) -> Result<Response> {
//!         Response::ok().with_json(&json!({"users": []}))
//!     }
//! }
//! ```

mod error;
pub mod extensions;
pub mod middleware;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use extensions::Extensions;
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuilder, RouteSettings};
pub use response::{Failure, Indent, Response, ResponseBody, StringifySettings};
