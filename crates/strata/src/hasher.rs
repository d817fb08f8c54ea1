//! Hasher format for content hashing of stored values and configuration
//! scopes. Capable of handling multiple versions and object variants.

use base64::Engine;
use sha2::{Digest, Sha512};

pub enum Hasher {
	V1(Sha512),
}

impl Hasher {
	pub fn new() -> Self {
		Self::V1(Sha512::new())
	}

	pub fn new_v1() -> Self {
		Self::V1(Sha512::new())
	}

	pub fn update(&mut self, data: &[u8]) {
		match self {
			Self::V1(hasher) => hasher.update(data),
		}
	}

	pub fn finalize(self, prefix: &str) -> Box<str> {
		match self {
			Self::V1(hasher) => (prefix.to_string()
				+ "1~"
				+ &base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize()))
				.into(),
		}
	}
}

impl Default for Hasher {
	fn default() -> Self {
		Self::new()
	}
}

pub fn hash(prefix: &str, data: &[u8]) -> Box<str> {
	let mut hasher = Hasher::new();
	hasher.update(data);
	hasher.finalize(prefix)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_hash_deterministic() {
		assert_eq!(hash("V", b"abc"), hash("V", b"abc"));
		assert_ne!(hash("V", b"abc"), hash("V", b"abd"));
	}

	#[test]
	fn test_hash_prefix_and_version() {
		let h = hash("C", b"payload");
		assert!(h.starts_with("C1~"));
	}
}

// vim: ts=4
