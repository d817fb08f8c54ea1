//! Setting categories: a parent-pointer forest carrying scope, visibility
//! and profile-dimension metadata.
//!
//! Scope and hidden attributes are inherited from the nearest ancestor when
//! not declared on a node. Inheritance is resolved eagerly when the registry
//! is frozen; a chain that walks past its root without finding a scope is a
//! fatal schema error.

use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::schema::catalog::SettingKey;

/// Where a setting applies: system-wide or per-domain.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Scope {
	#[serde(rename = "system")]
	System,
	#[serde(rename = "domain")]
	Domain,
}

/// Who may modify a setting.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PermissionLevel {
	/// Cannot be changed at runtime (read-only).
	#[serde(rename = "system")]
	System,
	#[serde(rename = "admin")]
	Admin,
	#[serde(rename = "user")]
	User,
}

impl PermissionLevel {
	/// Check if the given roles satisfy this permission level
	pub fn check<S: AsRef<str>>(&self, roles: &[S]) -> bool {
		match self {
			PermissionLevel::System => false,
			PermissionLevel::Admin => roles.iter().any(|r| r.as_ref() == "SADM"),
			PermissionLevel::User => true,
		}
	}
}

/// Grouping nodes of the settings hierarchy.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Category {
	General,
	Logging,
	Security,
	Database,
	Email,
	Ldap,
	Policy,
	Ui,
}

impl Category {
	pub const ALL: &'static [Category] = &[
		Category::General,
		Category::Logging,
		Category::Security,
		Category::Database,
		Category::Email,
		Category::Ldap,
		Category::Policy,
		Category::Ui,
	];

	/// Static declaration for this node. Scope/hidden left `None` inherit
	/// from the parent chain at freeze time.
	pub fn declaration(self) -> CategoryDeclaration {
		match self {
			Category::General => CategoryDeclaration {
				label: "General",
				parent: None,
				scope: Some(Scope::System),
				hidden: Some(false),
				level: 0,
				profile_setting: None,
			},
			Category::Logging => CategoryDeclaration {
				label: "Logging",
				parent: Some(Category::General),
				scope: None,
				hidden: None,
				level: 1,
				profile_setting: None,
			},
			Category::Security => CategoryDeclaration {
				label: "Security",
				parent: None,
				scope: Some(Scope::System),
				hidden: Some(false),
				level: 1,
				profile_setting: None,
			},
			Category::Database => CategoryDeclaration {
				label: "Database",
				parent: Some(Category::Security),
				scope: None,
				hidden: None,
				level: 2,
				profile_setting: None,
			},
			Category::Email => CategoryDeclaration {
				label: "Email Servers",
				parent: None,
				scope: Some(Scope::System),
				hidden: Some(false),
				level: 1,
				profile_setting: Some(SettingKey::EmailServerList),
			},
			Category::Ldap => CategoryDeclaration {
				label: "LDAP Directories",
				parent: None,
				scope: Some(Scope::Domain),
				hidden: Some(false),
				level: 0,
				profile_setting: Some(SettingKey::LdapProfileList),
			},
			Category::Policy => CategoryDeclaration {
				label: "Policies",
				parent: None,
				scope: Some(Scope::Domain),
				hidden: Some(false),
				level: 1,
				profile_setting: None,
			},
			Category::Ui => CategoryDeclaration {
				label: "User Interface",
				parent: None,
				scope: Some(Scope::Domain),
				hidden: Some(false),
				level: 2,
				profile_setting: None,
			},
		}
	}
}

/// Raw declared attributes of a category node.
#[derive(Clone, Debug)]
pub struct CategoryDeclaration {
	pub label: &'static str,
	pub parent: Option<Category>,
	pub scope: Option<Scope>,
	pub hidden: Option<bool>,
	pub level: u8,
	pub profile_setting: Option<SettingKey>,
}

/// Category attributes with inheritance already applied.
#[derive(Clone, Debug)]
pub struct ResolvedCategory {
	pub scope: Scope,
	pub hidden: bool,
	pub level: u8,
	pub profile_setting: Option<SettingKey>,
	/// Root-to-leaf label path, used in diagnostics.
	pub path: Box<str>,
}

impl ResolvedCategory {
	pub fn profiled(&self) -> bool {
		self.profile_setting.is_some()
	}
}

/// Resolve one category against a declaration lookup. Separated from the
/// static table so the walk-past-root failure stays testable.
pub(crate) fn resolve_category(
	category: Category,
	decl_of: &dyn Fn(Category) -> CategoryDeclaration,
) -> StResult<ResolvedCategory> {
	let decl = decl_of(category);

	let mut scope = decl.scope;
	let mut hidden = decl.hidden;
	let mut labels = vec![decl.label];
	let mut cursor = decl.parent;
	while let Some(parent) = cursor {
		let parent_decl = decl_of(parent);
		if scope.is_none() {
			scope = parent_decl.scope;
		}
		if hidden.is_none() {
			hidden = parent_decl.hidden;
		}
		labels.push(parent_decl.label);
		cursor = parent_decl.parent;
	}

	let scope = scope.ok_or_else(|| {
		Error::SchemaError(format!("category {:?} resolves no scope on its ancestor chain", category))
	})?;

	labels.reverse();
	Ok(ResolvedCategory {
		scope,
		hidden: hidden.unwrap_or(false),
		level: decl.level,
		profile_setting: decl.profile_setting,
		path: labels.join(" / ").into(),
	})
}


// vim: ts=4
