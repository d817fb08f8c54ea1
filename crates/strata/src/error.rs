//! Error taxonomy for the configuration core.
//!
//! Schema and scope/profile errors indicate the process is unsafe to continue
//! in its current shape and are raised loudly; secure-codec errors are typed
//! failures the caller is expected to report rather than crash on.

pub type StResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,

	/// Schema integrity failure: missing default association, unparseable
	/// validation pattern, unresolvable category scope. Fatal at startup.
	SchemaError(String),
	/// Domain-scoped setting read through the system pseudo-domain or vice
	/// versa. Caller bug, not bad configuration data.
	ScopeViolation(String),
	/// Profiled setting read without a profile context or vice versa.
	ProfileViolation(String),
	/// Typed read that does not match the setting's declared syntax.
	TypeMismatch(String),
	/// Decryption failure or malformed secure payload. Recoverable, reported.
	SecureCodecError(String),
	/// A stored value failed validation against its definition.
	ValidationError(String),

	// externals
	Io(std::io::Error),
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::SchemaError(msg) => write!(f, "schema error: {}", msg),
			Error::ScopeViolation(msg) => write!(f, "scope violation: {}", msg),
			Error::ProfileViolation(msg) => write!(f, "profile violation: {}", msg),
			Error::TypeMismatch(msg) => write!(f, "type mismatch: {}", msg),
			Error::SecureCodecError(msg) => write!(f, "secure codec error: {}", msg),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<regex::Error> for Error {
	fn from(err: regex::Error) -> Self {
		Self::SchemaError(format!("invalid validation pattern: {}", err))
	}
}

// vim: ts=4
