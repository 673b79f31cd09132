//! Response fingerprinting
//!
//! [`ETagger`] owns the process-wide default options and the hashing
//! strategy. It is immutable after construction, so one instance can be
//! shared by every in-flight request.

use etagger_http::{Response, ResponseBody, Result, StringifySettings};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::canonical;
use crate::digest::{Digester, Sha256Base64};
use crate::options::{TagOptions, TagOptionsOverride};
use crate::policy::Eligibility;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Computes fingerprints and attaches them to responses.
#[derive(Clone)]
pub struct ETagger {
	defaults: TagOptions,
	digester: Arc<dyn Digester>,
}

impl ETagger {
	/// Tagger with the given defaults, hashing with [`Sha256Base64`].
	pub fn new(defaults: TagOptions) -> Self {
		Self {
			defaults,
			digester: Arc::new(Sha256Base64),
		}
	}

	/// Replace the hashing strategy.
	pub fn with_digester(mut self, digester: impl Digester + 'static) -> Self {
		self.digester = Arc::new(digester);
		self
	}

	pub fn defaults(&self) -> &TagOptions {
		&self.defaults
	}

	/// Fingerprint of a structured value under `settings`.
	///
	/// # Errors
	///
	/// Fails when the allowlist projection is applied to a non-object.
	///
	/// # Examples
	///
	/// ```
	/// use etagger_http::StringifySettings;
	/// use etagger_middleware::{ETagger, TagOptions};
	/// use serde_json::json;
	///
	/// let tagger = ETagger::new(TagOptions::default());
	/// let settings = StringifySettings::default();
	///
	/// assert_eq!(
	///     tagger.fingerprint_value(&json!({"a": 1, "b": 2}), &settings).unwrap(),
	///     tagger.fingerprint_value(&json!({"b": 2, "a": 1}), &settings).unwrap(),
	/// );
	/// ```
	pub fn fingerprint_value(&self, value: &Value, settings: &StringifySettings) -> Result<String> {
		let canonical = canonical::canonicalize(value, settings)?;
		Ok(self.digester.digest(canonical.as_bytes()))
	}

	/// Fingerprint of raw bytes, hashed as-is.
	pub fn fingerprint_bytes(&self, data: &[u8]) -> String {
		self.digester.digest(data)
	}

	/// Automatic post-handler tagging.
	///
	/// Merges `route` over the defaults and tags the response when the
	/// eligibility policy allows it. Ineligible responses come back
	/// unchanged.
	///
	/// # Errors
	///
	/// Fails when canonical serialization fails or the digester produces a
	/// token that cannot be used as an entity tag.
	pub fn tag(&self, response: Response, route: Option<&TagOptionsOverride>) -> Result<Response> {
		self.apply(response, route, false)
	}

	/// Manual tagging for responses assembled by application code.
	///
	/// Same contract as [`tag`](Self::tag), except that the `enabled`
	/// option is ignored. Failure bodies and, with `only_on_success`,
	/// non-2xx statuses are still left untouched.
	///
	/// # Examples
	///
	/// ```
	/// use etagger_http::Response;
	/// use etagger_middleware::{ETagger, TagOptions};
	///
	/// let tagger = ETagger::new(TagOptions::default());
	/// let response = tagger.force_tag(Response::ok().with_body("ab"), None).unwrap();
	///
	/// assert!(response.etag().is_some());
	/// ```
	pub fn force_tag(
		&self,
		response: Response,
		options: Option<&TagOptionsOverride>,
	) -> Result<Response> {
		self.apply(response, options, true)
	}

	fn apply(
		&self,
		mut response: Response,
		overrides: Option<&TagOptionsOverride>,
		force: bool,
	) -> Result<Response> {
		let options = match overrides {
			Some(overrides) => self.defaults.merge(overrides),
			None => self.defaults,
		};

		let eligibility = Eligibility::evaluate(&response, &options, force);
		if !eligibility.is_eligible() {
			tracing::trace!(
				status = response.status.as_u16(),
				body = response.body.kind(),
				reason = eligibility.as_str(),
				"response not tagged"
			);
			return Ok(response);
		}

		let kind = response.body.kind();
		let (token, body) = match std::mem::take(&mut response.body) {
			ResponseBody::Json(value) => {
				let canonical = canonical::canonicalize(&value, &response.stringify)?;
				let token = self.digester.digest(canonical.as_bytes());
				response.set_content_type(JSON_CONTENT_TYPE);
				// null is hashed as "null" but transmitted as no content
				let body = if value.is_null() {
					ResponseBody::Empty
				} else {
					ResponseBody::Text(canonical)
				};
				(token, body)
			}
			ResponseBody::Text(text) => (self.digester.digest(text.as_bytes()), ResponseBody::Text(text)),
			ResponseBody::Bytes(bytes) => (self.digester.digest(&bytes), ResponseBody::Bytes(bytes)),
			ResponseBody::Empty => (self.digester.digest(&[]), ResponseBody::Empty),
			other => {
				response.body = other;
				return Ok(response);
			}
		};

		response.body = body;
		response.set_etag(&token)?;

		tracing::debug!(
			status = response.status.as_u16(),
			body = kind,
			etag = %token,
			forced = force,
			"response tagged"
		);

		Ok(response)
	}
}

impl Default for ETagger {
	fn default() -> Self {
		Self::new(TagOptions::default())
	}
}

impl fmt::Debug for ETagger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ETagger")
			.field("defaults", &self.defaults)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::digest::Sha256Hex128;
	use bytes::Bytes;
	use etagger_http::{Error, Failure, Indent};
	use hyper::StatusCode;
	use hyper::header::CONTENT_TYPE;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn tagger() -> ETagger {
		ETagger::new(TagOptions::new().enabled(true))
	}

	#[rstest]
	fn test_json_body_is_canonicalized(tagger: ETagger) {
		let response = Response::ok().with_body(json!({"b": 2, "a": 1}));

		let tagged = tagger.tag(response, None).unwrap();

		assert_eq!(tagged.etag(), Some("\"QyWM/3g/5wNtikMDP4MK38YOwDc4JHNUisdCuIgpJ3c=\""));
		assert_eq!(tagged.body, ResponseBody::Text(r#"{"a":1,"b":2}"#.to_string()));
		assert_eq!(tagged.headers.get(CONTENT_TYPE).unwrap(), JSON_CONTENT_TYPE);
	}

	#[rstest]
	fn test_null_body_is_tagged_but_sent_empty(tagger: ETagger) {
		let response = Response::ok().with_body(json!(null));

		let tagged = tagger.tag(response, None).unwrap();

		assert_eq!(tagged.etag(), Some("\"dCNOmK/nSY+12vHzasLXiswzlGT5UHA7jAGYkvmCuQs=\""));
		assert_eq!(tagged.body, ResponseBody::Empty);
		assert!(tagged.payload().unwrap().is_empty());
	}

	#[rstest]
	fn test_null_and_empty_bodies_differ(tagger: ETagger) {
		let null = tagger.tag(Response::ok().with_body(json!(null)), None).unwrap();
		let empty = tagger.tag(Response::ok(), None).unwrap();

		assert_eq!(empty.etag(), Some("\"47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=\""));
		assert_ne!(null.etag(), empty.etag());
	}

	#[rstest]
	fn test_bytes_body_is_not_reserialized(tagger: ETagger) {
		let body = Bytes::from_static(&[1, 2, 3]);
		let response = Response::ok().with_body(body.clone());

		let tagged = tagger.tag(response, None).unwrap();

		assert_eq!(tagged.etag(), Some("\"A5BYxvLAy0ksUzsKTRTvd8wPeKvMztUofYShogEc+4E=\""));
		assert_eq!(tagged.body, ResponseBody::Bytes(body));
		assert!(tagged.headers.get(CONTENT_TYPE).is_none());
	}

	#[rstest]
	fn test_text_body_is_hashed_verbatim(tagger: ETagger) {
		let tagged = tagger.tag(Response::ok().with_body("a"), None).unwrap();

		assert_eq!(tagged.etag(), Some("\"ypeBEsobvcr6wjGzmiPcTaeG7/gUfE5yuYB3ha/uSLs=\""));
		assert_eq!(tagged.body, ResponseBody::Text("a".to_string()));
	}

	#[rstest]
	fn test_disabled_leaves_response_untouched() {
		let tagger = ETagger::default();
		let response = Response::ok().with_body(json!({"b": 2, "a": 1}));

		let untouched = tagger.tag(response, None).unwrap();

		assert!(untouched.etag().is_none());
		assert_eq!(untouched.payload().unwrap(), r#"{"b":2,"a":1}"#);
		assert!(untouched.headers.get(CONTENT_TYPE).is_none());
	}

	#[rstest]
	fn test_route_override_enables_tagging() {
		let tagger = ETagger::default();
		let route = TagOptionsOverride {
			enabled: Some(true),
			only_on_success: None,
		};

		let tagged = tagger.tag(Response::ok().with_body("a"), Some(&route)).unwrap();

		assert!(tagged.etag().is_some());
	}

	#[rstest]
	fn test_failure_body_is_never_tagged(tagger: ETagger) {
		let response = Response::failure(StatusCode::IM_A_TEAPOT, Failure::new("xyz"));

		let untouched = tagger.force_tag(response, None).unwrap();

		assert!(untouched.etag().is_none());
		assert!(untouched.body.is_failure());
	}

	#[rstest]
	fn test_force_tag_ignores_enabled() {
		let tagger = ETagger::default();
		let overrides = TagOptionsOverride {
			enabled: Some(false),
			only_on_success: None,
		};

		let tagged = tagger
			.force_tag(Response::ok().with_body("ab"), Some(&overrides))
			.unwrap();

		assert!(tagged.etag().is_some());
	}

	#[rstest]
	fn test_tagging_twice_yields_same_token(tagger: ETagger) {
		let first = tagger.tag(Response::ok().with_body(json!({"a": [1, 2]})), None).unwrap();
		let second = tagger.tag(first.clone(), None).unwrap();

		assert_eq!(first.etag(), second.etag());
		assert_eq!(first.body, second.body);
	}

	#[rstest]
	fn test_existing_etag_is_replaced(tagger: ETagger) {
		let response = Response::ok().with_body("a").with_header("etag", "\"stale\"");

		let tagged = tagger.tag(response, None).unwrap();

		assert_ne!(tagged.etag(), Some("\"stale\""));
	}

	#[rstest]
	fn test_indent_changes_body_and_tag(tagger: ETagger) {
		let value = json!({"b": 2, "a": 1});
		let pretty = StringifySettings::new().with_indent(Indent::Spaces(2));

		let compact = tagger.tag(Response::ok().with_body(value.clone()), None).unwrap();
		let indented = tagger
			.tag(Response::ok().with_body(value).with_stringify(pretty), None)
			.unwrap();

		assert_eq!(
			indented.body,
			ResponseBody::Text("{\n  \"a\": 1,\n  \"b\": 2\n}".to_string())
		);
		assert_ne!(compact.etag(), indented.etag());
	}

	#[rstest]
	fn test_allowlist_restricts_fingerprint(tagger: ETagger) {
		let settings = StringifySettings::new().with_allowlist(["a"]);
		let first = tagger
			.tag(
				Response::ok()
					.with_body(json!({"a": 1, "updated": 1}))
					.with_stringify(settings.clone()),
				None,
			)
			.unwrap();
		let second = tagger
			.tag(
				Response::ok()
					.with_body(json!({"a": 1, "updated": 2}))
					.with_stringify(settings),
				None,
			)
			.unwrap();

		assert_eq!(first.etag(), second.etag());
		assert_eq!(first.body, ResponseBody::Text(r#"{"a":1}"#.to_string()));
	}

	#[rstest]
	fn test_allowlist_on_array_propagates_error(tagger: ETagger) {
		let response = Response::ok()
			.with_body(json!([1, 2]))
			.with_stringify(StringifySettings::new().with_allowlist(["a"]));

		let error = tagger.tag(response, None).unwrap_err();

		assert!(matches!(error, Error::Serialization(_)));
	}

	#[rstest]
	fn test_injected_digester(tagger: ETagger) {
		let hex = tagger.clone().with_digester(Sha256Hex128);
		let counting = tagger.with_digester(|data: &[u8]| format!("len-{}", data.len()));

		let hexed = hex.tag(Response::ok().with_body("a"), None).unwrap();
		let counted = counting.tag(Response::ok().with_body("abc"), None).unwrap();

		assert_eq!(hexed.etag(), Some("\"ca978112ca1bbdcafac231b39a23dc4d\""));
		assert_eq!(counted.etag(), Some("\"len-3\""));
	}

	#[rstest]
	fn test_invalid_token_from_digester_is_an_error(tagger: ETagger) {
		let quoting = tagger.with_digester(|_: &[u8]| "a\"b".to_string());

		let error = quoting.tag(Response::ok().with_body("a"), None).unwrap_err();

		assert!(matches!(error, Error::Http(_)));
	}
}
