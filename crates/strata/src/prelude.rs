pub use crate::error::{Error, StResult};
pub use crate::types::{DomainId, ProfileId, Timestamp};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
