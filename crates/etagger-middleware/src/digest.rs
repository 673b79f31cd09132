//! Hashing strategies
//!
//! A [`Digester`] turns the bytes of a body into the printable token placed
//! in the `ETag` header. Only the deployment that issued a tag ever compares
//! it, so the algorithm is a construction-time choice.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

/// Maps a byte sequence to a printable token.
///
/// Implementations must be deterministic and must produce tokens that are
/// valid inside a quoted entity tag (no `"`, no control characters).
/// Closures of type `Fn(&[u8]) -> String` implement this trait.
///
/// # Examples
///
/// ```
/// use etagger_middleware::Digester;
///
/// let length = |data: &[u8]| format!("len-{}", data.len());
/// assert_eq!(length.digest(b"abc"), "len-3");
/// ```
pub trait Digester: Send + Sync {
	fn digest(&self, data: &[u8]) -> String;
}

impl<F> Digester for F
where
	F: Fn(&[u8]) -> String + Send + Sync,
{
	fn digest(&self, data: &[u8]) -> String {
		self(data)
	}
}

/// SHA-256, standard base64 with padding. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Base64;

impl Digester for Sha256Base64 {
	fn digest(&self, data: &[u8]) -> String {
		STANDARD.encode(<Sha256 as Digest>::digest(data))
	}
}

/// First 128 bits of SHA-256, lowercase hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hex128;

impl Digester for Sha256Hex128 {
	fn digest(&self, data: &[u8]) -> String {
		let result = <Sha256 as Digest>::digest(data);
		hex::encode(&result[..16])
	}
}
