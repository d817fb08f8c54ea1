//! Setting definitions and the definition registry.
//!
//! Definitions are declared through the builder, collected in a mutable
//! `SettingRegistry` during startup and frozen into an immutable
//! `FrozenSettingRegistry`. Freezing runs the schema integrity validation:
//! an inconsistent schema is a fatal startup failure, never a runtime error.

use regex::Regex;
use std::collections::HashMap;

use crate::prelude::*;
use crate::schema::catalog::SettingKey;
use crate::schema::category::{
	Category, PermissionLevel, ResolvedCategory, resolve_category,
};
use crate::schema::template::{self, TemplateAssociation, TemplateSet};
use crate::value::{StoredPassword, StoredValue, Syntax};

/// Declarative markers on a setting definition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flag {
	/// Value text supports macro expansion by the consumer.
	MacroSupport,
	/// Reads succeed but log a warning naming the setting's menu path.
	Deprecated,
	/// The setting has no default association. Only valid for password
	/// syntax, whose default is always the empty value.
	NoDefault,
	/// Changing the value requires a process restart to take effect.
	ReloadRequired,
}

/// Immutable metadata of one setting.
#[derive(Debug)]
pub struct SettingDefinition {
	pub key: SettingKey,
	pub label: Box<str>,
	pub syntax: Syntax,
	pub category: Category,
	pub flags: Vec<Flag>,
	pub required: bool,
	pub hidden: bool,
	pub level: u8,
	pub permission: PermissionLevel,
	pub pattern: Option<Regex>,
	/// Ordered default-value associations, resolved per template set.
	pub defaults: Vec<TemplateAssociation<StoredValue>>,
	/// Ordered example-value associations, resolved per template set.
	pub examples: Vec<TemplateAssociation<Box<str>>>,
}

impl SettingDefinition {
	pub fn builder(key: SettingKey, syntax: Syntax, category: Category) -> SettingDefinitionBuilder {
		SettingDefinitionBuilder::new(key, syntax, category)
	}

	pub fn has_flag(&self, flag: Flag) -> bool {
		self.flags.contains(&flag)
	}
}

/// Builder for SettingDefinition with fluent API
pub struct SettingDefinitionBuilder {
	key: SettingKey,
	syntax: Syntax,
	category: Category,
	label: Option<Box<str>>,
	flags: Vec<Flag>,
	required: bool,
	hidden: bool,
	level: u8,
	permission: PermissionLevel,
	pattern: Option<Box<str>>,
	defaults: Vec<TemplateAssociation<StoredValue>>,
	examples: Vec<TemplateAssociation<Box<str>>>,
}

impl SettingDefinitionBuilder {
	pub fn new(key: SettingKey, syntax: Syntax, category: Category) -> Self {
		Self {
			key,
			syntax,
			category,
			label: None,
			flags: Vec::new(),
			required: false,
			hidden: false,
			level: 1,
			permission: PermissionLevel::Admin, // Default to admin-only for safety
			pattern: None,
			defaults: Vec::new(),
			examples: Vec::new(),
		}
	}

	/// Set the display label (required)
	pub fn label(mut self, label: impl Into<Box<str>>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn flag(mut self, flag: Flag) -> Self {
		self.flags.push(flag);
		self
	}

	pub fn required(mut self, required: bool) -> Self {
		self.required = required;
		self
	}

	pub fn hidden(mut self, hidden: bool) -> Self {
		self.hidden = hidden;
		self
	}

	pub fn level(mut self, level: u8) -> Self {
		self.level = level;
		self
	}

	pub fn permission(mut self, permission: PermissionLevel) -> Self {
		self.permission = permission;
		self
	}

	/// Validation pattern, compiled at build time. An unparseable pattern is
	/// a fatal schema error.
	pub fn pattern(mut self, pattern: impl Into<Box<str>>) -> Self {
		self.pattern = Some(pattern.into());
		self
	}

	/// Catch-all default value (empty template association).
	pub fn default(mut self, value: StoredValue) -> Self {
		self.defaults.push(TemplateAssociation::new(value, []));
		self
	}

	/// Default value applying to a specific template subset. Declaration
	/// order is the tiebreak for equally specific associations.
	pub fn default_for(
		mut self,
		value: StoredValue,
		templates: impl IntoIterator<Item = template::Template>,
	) -> Self {
		self.defaults.push(TemplateAssociation::new(value, templates));
		self
	}

	/// Catch-all example value.
	pub fn example(mut self, example: impl Into<Box<str>>) -> Self {
		self.examples.push(TemplateAssociation::new(example.into(), []));
		self
	}

	pub fn example_for(
		mut self,
		example: impl Into<Box<str>>,
		templates: impl IntoIterator<Item = template::Template>,
	) -> Self {
		self.examples.push(TemplateAssociation::new(example.into(), templates));
		self
	}

	/// Build the SettingDefinition
	pub fn build(self) -> StResult<SettingDefinition> {
		let label = self.label.ok_or_else(|| {
			Error::SchemaError(format!("setting {} declares no label", self.key.as_str()))
		})?;

		let pattern = match self.pattern {
			Some(p) => Some(Regex::new(&p)?),
			None => None,
		};

		Ok(SettingDefinition {
			key: self.key,
			label,
			syntax: self.syntax,
			category: self.category,
			flags: self.flags,
			required: self.required,
			hidden: self.hidden,
			level: self.level,
			permission: self.permission,
			pattern,
			defaults: self.defaults,
			examples: self.examples,
		})
	}
}

/// Mutable registry used during startup registration.
pub struct SettingRegistry {
	definitions: HashMap<SettingKey, SettingDefinition>,
}

impl SettingRegistry {
	pub fn new() -> Self {
		Self { definitions: HashMap::new() }
	}

	/// Register a new setting definition
	pub fn register(&mut self, def: SettingDefinition) -> StResult<()> {
		if self.definitions.contains_key(&def.key) {
			return Err(Error::SchemaError(format!(
				"setting {} is already registered",
				def.key.as_str()
			)));
		}

		debug!("Registering setting: {}", def.key.as_str());
		self.definitions.insert(def.key, def);
		Ok(())
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}

	/// Freeze the registry (make it immutable), running the schema integrity
	/// validation. Any failure here means the process must not continue with
	/// a partially-loaded schema.
	pub fn freeze(self) -> StResult<FrozenSettingRegistry> {
		let mut categories = HashMap::new();
		for category in Category::ALL {
			categories.insert(*category, resolve_category(*category, &Category::declaration)?);
		}

		for key in SettingKey::ALL {
			let def = self.definitions.get(key).ok_or_else(|| {
				Error::SchemaError(format!("setting {} is not registered", key.as_str()))
			})?;

			if def.defaults.is_empty() {
				// Password syntax is the one exception: its default is always
				// the empty value
				if def.syntax != Syntax::Password {
					return Err(Error::SchemaError(format!(
						"setting {} resolves no default association",
						key.as_str()
					)));
				}
			}
			if def.has_flag(Flag::NoDefault) && def.syntax != Syntax::Password {
				return Err(Error::SchemaError(format!(
					"setting {} declares NoDefault on non-password syntax",
					key.as_str()
				)));
			}

			for association in &def.defaults {
				if association.value.syntax() != def.syntax {
					return Err(Error::SchemaError(format!(
						"setting {} declares a {} default but has syntax {:?}",
						key.as_str(),
						association.value.type_name(),
						def.syntax
					)));
				}
			}
		}

		// A profiled category must declare a registered profile-list setting
		for (category, resolved) in &categories {
			if let Some(profile_setting) = resolved.profile_setting {
				let def = self.definitions.get(&profile_setting).ok_or_else(|| {
					Error::SchemaError(format!(
						"category {:?} declares unregistered profile setting {}",
						category,
						profile_setting.as_str()
					))
				})?;
				if def.syntax != Syntax::Profile {
					return Err(Error::SchemaError(format!(
						"profile setting {} of category {:?} is not profile syntax",
						profile_setting.as_str(),
						category
					)));
				}
			}
		}

		info!("Freezing setting registry with {} definitions", self.definitions.len());
		Ok(FrozenSettingRegistry { definitions: self.definitions, categories })
	}
}

impl Default for SettingRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// Immutable registry shared across unlimited concurrent readers.
#[derive(Debug)]
pub struct FrozenSettingRegistry {
	definitions: HashMap<SettingKey, SettingDefinition>,
	categories: HashMap<Category, ResolvedCategory>,
}

impl FrozenSettingRegistry {
	/// Definition lookup. Total over the closed key enum once frozen.
	pub fn definition(&self, key: SettingKey) -> &SettingDefinition {
		self.definitions.get(&key).expect("FATAL: frozen registry misses a setting key")
	}

	/// Resolved category lookup. Total over the closed category enum.
	pub fn category(&self, category: Category) -> &ResolvedCategory {
		self.categories.get(&category).expect("FATAL: frozen registry misses a category")
	}

	/// The default value of `key` under `set`, per the template resolution
	/// rules. Password-syntax settings without associations yield the empty
	/// password value.
	pub fn default_value(&self, key: SettingKey, set: &TemplateSet) -> StoredValue {
		let def = self.definition(key);
		match template::resolve(&def.defaults, set) {
			Some(value) => value.clone(),
			None => StoredValue::Password(StoredPassword::empty()),
		}
	}

	/// The example value of `key` under `set`, if any is declared.
	pub fn example(&self, key: SettingKey, set: &TemplateSet) -> Option<&str> {
		let def = self.definition(key);
		template::resolve(&def.examples, set).map(AsRef::as_ref)
	}

	/// Definitions in stable key order.
	pub fn list(&self) -> impl Iterator<Item = &SettingDefinition> {
		SettingKey::ALL.iter().map(|key| self.definition(*key))
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

// vim: ts=4
