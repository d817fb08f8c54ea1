//! Stored configuration snapshots and the scoped read path.
//!
//! # Architecture
//!
//! - **Config** (`config.rs`): the immutable snapshot, its copy-on-write
//!   builder and per-domain content hashing
//! - **Reader** (`reader.rs`): the scoped facade with the scope/profile
//!   gate, typed accessors and profile-map construction

pub mod config;
pub mod reader;

pub use config::{ConfigProperty, StorageKey, StoredConfiguration, StoredConfigurationBuilder};
pub use reader::{
	BoundProfile, ProfileFactory, ProfileKind, ProfileMap, SettingProfile, SettingReader,
};

// vim: ts=4
