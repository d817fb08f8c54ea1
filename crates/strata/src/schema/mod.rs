//! Declarative setting schema: definitions, categories, templates.
//!
//! # Architecture
//!
//! - **Catalog** (`catalog.rs`): the closed setting-key enumeration and the
//!   per-area registration of every definition
//! - **Types** (`types.rs`): definitions, the builder and the registry
//! - **Category** (`category.rs`): the category forest with inherited
//!   scope/visibility attributes
//! - **Template** (`template.rs`): product-variant templates and the
//!   default-value resolution algorithm
//!
//! # Scope vs Permission Separation
//!
//! Settings have two independent dimensions:
//! - **Scope**: where the value applies (system-wide or per-domain),
//!   inherited from the category tree
//! - **Permission**: who can modify it (System/Admin/User)

pub mod catalog;
pub mod category;
pub mod template;
pub mod types;

pub use catalog::{SettingKey, registry};
pub use category::{Category, PermissionLevel, ResolvedCategory, Scope};
pub use template::{Template, TemplateAssociation, TemplateSet, TemplateType};
pub use types::{
	Flag, FrozenSettingRegistry, SettingDefinition, SettingDefinitionBuilder, SettingRegistry,
};

// vim: ts=4
