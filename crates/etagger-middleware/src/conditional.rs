//! Conditional GET Middleware
//!
//! Answers `If-None-Match` requests with `304 Not Modified` when the
//! response's `ETag` matches. Tags are produced by
//! [`ETagMiddleware`](crate::ETagMiddleware); this middleware only compares.

use async_trait::async_trait;
use etagger_http::{Handler, Middleware, Request, Response, Result};
use hyper::header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH, VARY};
use hyper::Method;
use std::sync::Arc;

/// Conditional GET middleware
///
/// Register it outside of [`ETagMiddleware`](crate::ETagMiddleware) so the
/// comparison sees the tagged response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalGetMiddleware;

impl ConditionalGetMiddleware {
	pub fn new() -> Self {
		Self
	}

	/// Split an `If-None-Match` value into its entity tags
	fn parse_if_none_match(value: &str) -> Vec<&str> {
		value
			.split(',')
			.map(str::trim)
			.filter(|tag| !tag.is_empty())
			.collect()
	}

	/// Opaque part of an entity tag, without a single `W/` prefix.
	fn opaque(tag: &str) -> &str {
		tag.strip_prefix("W/").unwrap_or(tag)
	}

	/// Weak comparison: one `W/` prefix on either side is ignored.
	fn etag_matches(etag: &str, candidates: &[&str]) -> bool {
		let etag = Self::opaque(etag);
		candidates
			.iter()
			.any(|candidate| *candidate == "*" || Self::opaque(candidate) == etag)
	}

	fn not_modified(response: &Response) -> Response {
		let mut not_modified = Response::not_modified();
		for name in [ETAG, CACHE_CONTROL, VARY] {
			if let Some(value) = response.headers.get(&name) {
				not_modified.headers.insert(name, value.clone());
			}
		}
		not_modified
	}
}

#[async_trait]
impl Middleware for ConditionalGetMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let if_none_match = request
			.headers
			.get(IF_NONE_MATCH)
			.and_then(|v| v.to_str().ok())
			.map(str::to_string);
		let method = request.method.clone();
		let path = request.path().to_string();

		let response = next.handle(request).await?;

		if method != Method::GET && method != Method::HEAD {
			return Ok(response);
		}
		if !response.status.is_success() {
			return Ok(response);
		}

		let (Some(if_none_match), Some(etag)) = (if_none_match, response.etag()) else {
			return Ok(response);
		};

		if Self::etag_matches(etag, &Self::parse_if_none_match(&if_none_match)) {
			tracing::debug!(path = %path, etag = %etag, "not modified");
			return Ok(Self::not_modified(&response));
		}

		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use etagger_http::ResponseBody;
	use hyper::StatusCode;
	use rstest::rstest;

	struct TestHandler {
		status: StatusCode,
		with_etag: Option<&'static str>,
	}

	#[async_trait]
	impl Handler for TestHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			let mut response = Response::new(self.status)
				.with_body("test response")
				.with_header("cache-control", "max-age=60");
			if let Some(etag) = self.with_etag {
				response = response.with_header("etag", etag);
			}
			Ok(response)
		}
	}

	fn handler(with_etag: Option<&'static str>) -> Arc<dyn Handler> {
		Arc::new(TestHandler {
			status: StatusCode::OK,
			with_etag,
		})
	}

	fn request(method: Method, if_none_match: Option<&str>) -> Request {
		let mut builder = Request::builder().method(method).uri("/test");
		if let Some(value) = if_none_match {
			builder = builder.header("If-None-Match", value);
		}
		builder.build().unwrap()
	}

	#[rstest]
	#[case("\"abc123\"")]
	#[case("\"other\", \"abc123\"")]
	#[case("*")]
	#[case("W/\"abc123\"")]
	#[tokio::test]
	async fn test_matching_if_none_match_returns_304(#[case] if_none_match: &str) {
		let middleware = ConditionalGetMiddleware::new();

		let response = middleware
			.process(
				request(Method::GET, Some(if_none_match)),
				handler(Some("\"abc123\"")),
			)
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::NOT_MODIFIED);
		assert_eq!(response.body, ResponseBody::Empty);
		assert_eq!(response.etag(), Some("\"abc123\""));
		assert_eq!(response.headers.get(CACHE_CONTROL).unwrap(), "max-age=60");
	}

	#[rstest]
	#[tokio::test]
	async fn test_different_etag_passes_through() {
		let middleware = ConditionalGetMiddleware::new();

		let response = middleware
			.process(
				request(Method::GET, Some("\"different-etag\"")),
				handler(Some("\"abc123\"")),
			)
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.body, ResponseBody::Text("test response".to_string()));
	}

	#[rstest]
	#[tokio::test]
	async fn test_untagged_response_passes_through() {
		let middleware = ConditionalGetMiddleware::new();

		let response = middleware
			.process(request(Method::GET, Some("*")), handler(None))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
	}

	#[rstest]
	#[tokio::test]
	async fn test_post_is_never_short_circuited() {
		let middleware = ConditionalGetMiddleware::new();

		let response = middleware
			.process(
				request(Method::POST, Some("\"abc123\"")),
				handler(Some("\"abc123\"")),
			)
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
	}

	#[rstest]
	#[tokio::test]
	async fn test_non_success_is_never_short_circuited() {
		let middleware = ConditionalGetMiddleware::new();
		let handler = Arc::new(TestHandler {
			status: StatusCode::BAD_REQUEST,
			with_etag: Some("\"abc123\""),
		});

		let response = middleware
			.process(request(Method::GET, Some("\"abc123\"")), handler)
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::BAD_REQUEST);
	}

	#[rstest]
	#[case("W/W/\"abc123\"")]
	#[case("W/abc123")]
	#[case("\"ABC123\"")]
	#[tokio::test]
	async fn test_malformed_or_different_tags_do_not_match(#[case] if_none_match: &str) {
		let middleware = ConditionalGetMiddleware::new();

		let response = middleware
			.process(
				request(Method::GET, Some(if_none_match)),
				handler(Some("\"abc123\"")),
			)
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
	}

	#[rstest]
	#[case("W/\"x\"", "\"x\"")]
	#[case("W/W/\"x\"", "W/\"x\"")]
	#[case("\"x\"", "\"x\"")]
	fn test_opaque_strips_one_weak_prefix(#[case] tag: &str, #[case] expected: &str) {
		assert_eq!(ConditionalGetMiddleware::opaque(tag), expected);
	}

	#[rstest]
	#[case("\"a\", , \"b\"", vec!["\"a\"", "\"b\""])]
	#[case("*", vec!["*"])]
	#[case("", vec![])]
	fn test_parse_if_none_match(#[case] value: &str, #[case] expected: Vec<&str>) {
		assert_eq!(ConditionalGetMiddleware::parse_if_none_match(value), expected);
	}
}
