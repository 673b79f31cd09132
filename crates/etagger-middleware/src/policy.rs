//! Eligibility policy
//!
//! Decides whether a response may carry a fingerprint. The rules are
//! checked in order and the first failing rule wins:
//!
//! 1. tagging must be enabled, unless the caller forces it
//! 2. failure bodies are never tagged
//! 3. with `only_on_success`, the status must be 2xx
//! 4. the body kind must be one the tagger knows how to hash

use etagger_http::{Response, ResponseBody};

use crate::TagOptions;

/// Outcome of the eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
	Eligible,
	Disabled,
	FailureBody,
	NonSuccessStatus,
	UnsupportedBody,
}

impl Eligibility {
	/// Evaluate the rules for `response`.
	///
	/// `force` bypasses the `enabled` rule only.
	pub fn evaluate(response: &Response, options: &TagOptions, force: bool) -> Self {
		if !(force || options.enabled) {
			return Eligibility::Disabled;
		}
		if response.body.is_failure() {
			return Eligibility::FailureBody;
		}
		if options.only_on_success && !response.status.is_success() {
			return Eligibility::NonSuccessStatus;
		}
		match response.body {
			ResponseBody::Json(_)
			| ResponseBody::Text(_)
			| ResponseBody::Bytes(_)
			| ResponseBody::Empty => Eligibility::Eligible,
			_ => Eligibility::UnsupportedBody,
		}
	}

	pub fn is_eligible(self) -> bool {
		self == Eligibility::Eligible
	}

	/// Reason string for logs.
	pub fn as_str(self) -> &'static str {
		match self {
			Eligibility::Eligible => "eligible",
			Eligibility::Disabled => "disabled",
			Eligibility::FailureBody => "failure body",
			Eligibility::NonSuccessStatus => "non-success status",
			Eligibility::UnsupportedBody => "unsupported body",
		}
	}
}

/// Whether `response` may be fingerprinted under `options`.
///
/// # Examples
///
/// ```
/// use etagger_http::Response;
/// use etagger_middleware::{TagOptions, is_eligible};
/// use hyper::StatusCode;
///
/// let options = TagOptions::new().enabled(true).only_on_success(true);
///
/// assert!(is_eligible(&Response::ok().with_body("a"), &options, false));
/// assert!(!is_eligible(&Response::bad_request().with_body("a"), &options, false));
/// assert!(!is_eligible(&Response::ok(), &TagOptions::default(), false));
/// assert!(is_eligible(&Response::ok(), &TagOptions::default(), true));
/// ```
pub fn is_eligible(response: &Response, options: &TagOptions, force: bool) -> bool {
	Eligibility::evaluate(response, options, force).is_eligible()
}
