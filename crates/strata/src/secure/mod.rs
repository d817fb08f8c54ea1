//! Secure value codec: reversible protection of sensitive setting payloads.
//!
//! Encoded values carry a self-describing prefix so the actual encoding mode
//! is recoverable from the stored form alone; the caller's mode hint is only
//! consulted when no known prefix is present. This keeps old plaintext values
//! readable after a deployment switches its default mode to `Encoded`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use rand::RngExt;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

pub mod key;

pub use key::{SecurityKey, domain_key};

/// Secure-encoding mode of a sensitive value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecureMode {
	/// Cleartext with a distinguishing prefix; round-trips exactly.
	Plain,
	/// One-way: decoding always yields the fixed placeholder, never the
	/// original. For display/export paths that must never leak secrets.
	Stripped,
	/// Symmetrically encrypted under a caller-supplied security key.
	Encoded,
}

/// Fixed placeholder returned when decoding a stripped value.
pub const VALUE_REMOVED_PLACEHOLDER: &str = "[value removed]";

const PREFIX_PLAIN: &str = "PLAIN:";
const PREFIX_ENCODED: &str = "ENC.AES256GCM:";
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Inner record wrapped before encryption. The random salt makes equal
/// plaintexts produce unequal ciphertexts even under a reused nonce source.
#[derive(Serialize, Deserialize)]
struct SecureRecord {
	salt: String,
	value: String,
}

fn has_known_prefix(input: &str) -> bool {
	input.starts_with(PREFIX_PLAIN) || input.starts_with(PREFIX_ENCODED)
}

/// Encode `raw` under `mode`. Idempotent: input already bearing a recognized
/// prefix is returned unchanged.
pub fn encode(raw: &str, mode: SecureMode, key: &SecurityKey) -> StResult<Box<str>> {
	if has_known_prefix(raw) {
		return Ok(raw.into());
	}

	match mode {
		// Stripped is one-way on the decode side; its stored form is the
		// plain passthrough
		SecureMode::Plain | SecureMode::Stripped => {
			Ok(format!("{}{}", PREFIX_PLAIN, raw).into())
		}
		SecureMode::Encoded => {
			let payload = encrypt(raw, key)?;
			Ok(format!("{}{}", PREFIX_ENCODED, payload).into())
		}
	}
}

/// Decode a stored value. The detected prefix determines the actual mode;
/// `mode_hint` applies only to unprefixed legacy input. `Stripped` caller
/// intent always yields the fixed placeholder. Empty input decodes to `None`.
pub fn decode(input: &str, mode_hint: SecureMode, key: &SecurityKey) -> StResult<Option<Box<str>>> {
	if input.is_empty() {
		return Ok(None);
	}
	if mode_hint == SecureMode::Stripped {
		return Ok(Some(VALUE_REMOVED_PLACEHOLDER.into()));
	}

	if let Some(payload) = input.strip_prefix(PREFIX_ENCODED) {
		return decrypt(payload, key).map(Some);
	}
	if let Some(raw) = input.strip_prefix(PREFIX_PLAIN) {
		return Ok(Some(raw.into()));
	}

	match mode_hint {
		SecureMode::Plain => Ok(Some(input.into())),
		SecureMode::Encoded => decrypt(input, key).map(Some),
		SecureMode::Stripped => Ok(Some(VALUE_REMOVED_PLACEHOLDER.into())),
	}
}

fn encrypt(raw: &str, key: &SecurityKey) -> StResult<String> {
	let salt: String =
		rand::rng().sample_iter(rand::distr::Alphanumeric).take(SALT_LEN).map(char::from).collect();
	let record = SecureRecord { salt, value: raw.to_string() };
	let plaintext = serde_json::to_vec(&record)
		.map_err(|e| Error::SecureCodecError(format!("cannot serialize secure record: {}", e)))?;

	let cipher = Aes256Gcm::new(key.material().into());
	let mut nonce_bytes = [0u8; NONCE_LEN];
	rand::rng().fill(&mut nonce_bytes);
	let nonce = Nonce::from_slice(&nonce_bytes);

	let ciphertext = cipher
		.encrypt(nonce, plaintext.as_slice())
		.map_err(|e| Error::SecureCodecError(format!("encryption failed: {}", e)))?;

	let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
	payload.extend_from_slice(&nonce_bytes);
	payload.extend_from_slice(&ciphertext);
	Ok(base64::engine::general_purpose::STANDARD.encode(payload))
}

fn decrypt(payload: &str, key: &SecurityKey) -> StResult<Box<str>> {
	let payload = base64::engine::general_purpose::STANDARD
		.decode(payload.as_bytes())
		.map_err(|e| Error::SecureCodecError(format!("payload is not valid base64: {}", e)))?;
	if payload.len() <= NONCE_LEN {
		return Err(Error::SecureCodecError("payload is truncated".to_string()));
	}
	let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);

	let cipher = Aes256Gcm::new(key.material().into());
	let plaintext = cipher.decrypt(Nonce::from_slice(nonce_bytes), ciphertext).map_err(|_| {
		Error::SecureCodecError("decryption failed (wrong key or corrupted ciphertext)".to_string())
	})?;

	let record: SecureRecord = serde_json::from_slice(&plaintext)
		.map_err(|e| Error::SecureCodecError(format!("malformed secure record: {}", e)))?;
	Ok(record.value.into())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn test_key() -> SecurityKey {
		SecurityKey::from_phrase("test application key")
	}

	#[test]
	fn test_plain_round_trip() {
		let key = test_key();
		let encoded = encode("hello world", SecureMode::Plain, &key).unwrap();
		assert!(encoded.starts_with(PREFIX_PLAIN));
		let decoded = decode(&encoded, SecureMode::Plain, &key).unwrap();
		assert_eq!(decoded.as_deref(), Some("hello world"));
	}

	#[test]
	fn test_encoded_round_trip() {
		let key = test_key();
		let encoded = encode("s3cr3t", SecureMode::Encoded, &key).unwrap();
		assert!(encoded.starts_with(PREFIX_ENCODED));
		assert!(!encoded.contains("s3cr3t"));
		let decoded = decode(&encoded, SecureMode::Encoded, &key).unwrap();
		assert_eq!(decoded.as_deref(), Some("s3cr3t"));
	}

	#[test]
	fn test_prefix_wins_over_mode_hint() {
		// Encoded ciphertext decoded with a Plain hint still decrypts,
		// because the prefix describes the actual mode
		let key = test_key();
		let encoded = encode("s3cr3t", SecureMode::Encoded, &key).unwrap();
		let decoded = decode(&encoded, SecureMode::Plain, &key).unwrap();
		assert_eq!(decoded.as_deref(), Some("s3cr3t"));
	}

	#[test]
	fn test_encode_is_idempotent() {
		let key = test_key();
		let once = encode("value", SecureMode::Encoded, &key).unwrap();
		let twice = encode(&once, SecureMode::Encoded, &key).unwrap();
		assert_eq!(once, twice);

		let plain = encode("value", SecureMode::Plain, &key).unwrap();
		assert_eq!(encode(&plain, SecureMode::Plain, &key).unwrap(), plain);
	}

	#[test]
	fn test_stripped_is_one_way() {
		let key = test_key();
		let encoded = encode("confidential", SecureMode::Stripped, &key).unwrap();
		let decoded = decode(&encoded, SecureMode::Stripped, &key).unwrap();
		assert_eq!(decoded.as_deref(), Some(VALUE_REMOVED_PLACEHOLDER));
		assert_ne!(decoded.as_deref(), Some("confidential"));
	}

	#[test]
	fn test_unprefixed_legacy_input_follows_hint() {
		let key = test_key();
		let decoded = decode("bare legacy value", SecureMode::Plain, &key).unwrap();
		assert_eq!(decoded.as_deref(), Some("bare legacy value"));
	}

	#[test]
	fn test_empty_input_decodes_to_none() {
		let key = test_key();
		assert_eq!(decode("", SecureMode::Plain, &key).unwrap(), None);
		assert_eq!(decode("", SecureMode::Encoded, &key).unwrap(), None);
	}

	#[test]
	fn test_wrong_key_is_reported() {
		let encoded = encode("s3cr3t", SecureMode::Encoded, &test_key()).unwrap();
		let other = SecurityKey::from_phrase("a different key");
		let err = decode(&encoded, SecureMode::Encoded, &other).unwrap_err();
		assert!(matches!(err, Error::SecureCodecError(_)));
	}

	#[test]
	fn test_corrupted_payload_is_reported() {
		let key = test_key();
		let err = decode("ENC.AES256GCM:not-base64!!", SecureMode::Encoded, &key).unwrap_err();
		assert!(matches!(err, Error::SecureCodecError(_)));

		let err = decode("ENC.AES256GCM:AAAA", SecureMode::Encoded, &key).unwrap_err();
		assert!(matches!(err, Error::SecureCodecError(_)));
	}

	#[test]
	fn test_equal_plaintexts_produce_unequal_ciphertexts() {
		let key = test_key();
		let a = encode("same", SecureMode::Encoded, &key).unwrap();
		let b = encode("same", SecureMode::Encoded, &key).unwrap();
		assert_ne!(a, b);
	}
}

// vim: ts=4
