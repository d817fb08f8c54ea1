//! Strata is a multi-tenant settings resolution and secure configuration
//! store.
//!
//! # Features
//!
//! - Declarative setting registry
//!		- closed key enumeration, one immutable definition per setting
//!		- category forest with inherited scope and visibility
//!		- frozen at startup after integrity validation
//!	- Template-driven defaults
//!		- product-variant templates on orthogonal axes
//!		- most-specific-first resolution with declaration-order tiebreak
//!	- Scoped read path
//!		- system/domain/profile isolation enforced on every read
//!		- typed accessors over a tagged-union value model
//!	- Secure value codec
//!		- self-describing prefixed encoding for sensitive values
//!		- domain-scoped key derivation from configuration content

#![forbid(unsafe_code)]

pub mod error;
pub mod hasher;
pub mod prelude;
pub mod schema;
pub mod secure;
pub mod store;
pub mod types;
pub mod value;

pub use crate::error::{Error, StResult};
pub use crate::schema::{SettingKey, TemplateSet};
pub use crate::store::{SettingReader, StoredConfiguration};
pub use crate::types::{DomainId, ProfileId};

// vim: ts=4
