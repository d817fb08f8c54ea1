//! Product variant templates and template-set default resolution.
//!
//! A `Template` is a discrete tag on one axis (`TemplateType`); a
//! `TemplateSet` is a complete selection holding exactly one template per
//! declared axis. Default and example values in the setting schema are
//! associated with template subsets and resolved most-specific-first.

use serde::{Deserialize, Serialize};

/// Orthogonal template axes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TemplateType {
	LdapVendor,
	Storage,
	DbVendor,
}

impl TemplateType {
	pub const ALL: &'static [TemplateType] =
		&[TemplateType::LdapVendor, TemplateType::Storage, TemplateType::DbVendor];

	/// The template an incomplete selection is filled with on this axis.
	pub fn default_template(self) -> Template {
		match self {
			TemplateType::LdapVendor => Template::GenericLdap,
			TemplateType::Storage => Template::LocalStore,
			TemplateType::DbVendor => Template::GenericDb,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			TemplateType::LdapVendor => "Directory Vendor",
			TemplateType::Storage => "Storage Backend",
			TemplateType::DbVendor => "Database Vendor",
		}
	}
}

/// A single template tag. Each template belongs to exactly one axis.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Template {
	#[serde(rename = "ldap-generic")]
	GenericLdap,
	#[serde(rename = "ldap-ad")]
	ActiveDirectory,
	#[serde(rename = "ldap-openldap")]
	OpenLdap,
	#[serde(rename = "ldap-389ds")]
	Ds389,

	#[serde(rename = "store-local")]
	LocalStore,
	#[serde(rename = "store-ldap")]
	LdapStore,
	#[serde(rename = "store-db")]
	DbStore,

	#[serde(rename = "db-generic")]
	GenericDb,
	#[serde(rename = "db-postgres")]
	Postgres,
	#[serde(rename = "db-mysql")]
	Mysql,
}

impl Template {
	pub fn typ(self) -> TemplateType {
		match self {
			Template::GenericLdap
			| Template::ActiveDirectory
			| Template::OpenLdap
			| Template::Ds389 => TemplateType::LdapVendor,
			Template::LocalStore | Template::LdapStore | Template::DbStore => {
				TemplateType::Storage
			}
			Template::GenericDb | Template::Postgres | Template::Mysql => TemplateType::DbVendor,
		}
	}
}

/// A complete template selection: exactly one template per declared axis.
///
/// Construction enforces the closure invariant — for each axis the first
/// selected template wins and missing axes are filled with the axis default.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemplateSet {
	templates: Vec<Template>,
}

impl TemplateSet {
	pub fn new(selected: impl IntoIterator<Item = Template>) -> Self {
		let selected: Vec<Template> = selected.into_iter().collect();
		let templates = TemplateType::ALL
			.iter()
			.map(|typ| {
				selected
					.iter()
					.copied()
					.find(|t| t.typ() == *typ)
					.unwrap_or_else(|| typ.default_template())
			})
			.collect();
		TemplateSet { templates }
	}

	pub fn contains(&self, template: Template) -> bool {
		self.templates.contains(&template)
	}

	pub fn templates(&self) -> &[Template] {
		&self.templates
	}
}

impl Default for TemplateSet {
	fn default() -> Self {
		TemplateSet::new([])
	}
}

impl Serialize for TemplateSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		self.templates.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for TemplateSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		// Re-apply the closure invariant on the way in
		Ok(TemplateSet::new(Vec::<Template>::deserialize(deserializer)?))
	}
}

/// One value variant associated with a template subset.
#[derive(Clone, Debug)]
pub struct TemplateAssociation<T> {
	pub value: T,
	pub templates: Vec<Template>,
}

impl<T> TemplateAssociation<T> {
	pub fn new(value: T, templates: impl IntoIterator<Item = Template>) -> Self {
		TemplateAssociation { value, templates: templates.into_iter().collect() }
	}
}

/// Resolve the value variant applying to `set` from an ordered association
/// list. Most-specific-first with declaration-order tiebreak:
///
/// 1. A single-entry list returns its value regardless of templates.
/// 2. For match sizes descending from the list length down to zero, the first
///    association whose templates are all contained in `set` and whose
///    template count equals the match size is returned. Zero-template
///    associations therefore match last, as the catch-all.
/// 3. If no association ever matches, the first association is the fallback.
///    Under the closure invariant this path is unreachable whenever a
///    zero-template association is declared; it is kept as a defensive no-op.
pub fn resolve<'a, T>(
	associations: &'a [TemplateAssociation<T>],
	set: &TemplateSet,
) -> Option<&'a T> {
	match associations {
		[] => None,
		[only] => Some(&only.value),
		_ => {
			for match_size in (0..=associations.len()).rev() {
				for association in associations {
					if association.templates.len() == match_size
						&& association.templates.iter().all(|t| set.contains(*t))
					{
						return Some(&association.value);
					}
				}
			}
			Some(&associations[0].value)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_closure_invariant() {
		// Empty input fills every axis with its default
		let set = TemplateSet::new([]);
		assert_eq!(set.templates().len(), TemplateType::ALL.len());
		assert!(set.contains(Template::GenericLdap));
		assert!(set.contains(Template::LocalStore));
		assert!(set.contains(Template::GenericDb));

		// Partial input keeps the selection and fills the rest
		let set = TemplateSet::new([Template::ActiveDirectory]);
		assert!(set.contains(Template::ActiveDirectory));
		assert!(!set.contains(Template::GenericLdap));
		assert!(set.contains(Template::LocalStore));

		// Two templates on the same axis: first one wins
		let set = TemplateSet::new([Template::OpenLdap, Template::ActiveDirectory]);
		assert!(set.contains(Template::OpenLdap));
		assert!(!set.contains(Template::ActiveDirectory));
		assert_eq!(set.templates().len(), TemplateType::ALL.len());
	}

	#[test]
	fn test_resolve_single_entry_ignores_templates() {
		let associations = [TemplateAssociation::new("only", [Template::Mysql])];
		let set = TemplateSet::new([Template::Postgres]);
		assert_eq!(resolve(&associations, &set), Some(&"only"));
	}

	#[test]
	fn test_resolve_specificity_and_catch_all() {
		// Concrete scenario: ("A", {vendor1}) and ("B", {})
		let associations = [
			TemplateAssociation::new("A", [Template::ActiveDirectory]),
			TemplateAssociation::new("B", []),
		];
		let vendor1 = TemplateSet::new([Template::ActiveDirectory]);
		let vendor2 = TemplateSet::new([Template::OpenLdap]);
		assert_eq!(resolve(&associations, &vendor1), Some(&"A"));
		assert_eq!(resolve(&associations, &vendor2), Some(&"B"));
	}

	#[test]
	fn test_resolve_prefers_larger_intersection() {
		let associations = [
			TemplateAssociation::new("catch-all", []),
			TemplateAssociation::new("ad", [Template::ActiveDirectory]),
			TemplateAssociation::new(
				"ad-db",
				[Template::ActiveDirectory, Template::DbStore],
			),
		];
		let set = TemplateSet::new([Template::ActiveDirectory, Template::DbStore]);
		assert_eq!(resolve(&associations, &set), Some(&"ad-db"));

		let set = TemplateSet::new([Template::ActiveDirectory]);
		assert_eq!(resolve(&associations, &set), Some(&"ad"));

		let set = TemplateSet::new([Template::OpenLdap]);
		assert_eq!(resolve(&associations, &set), Some(&"catch-all"));
	}

	#[test]
	fn test_resolve_declaration_order_tiebreak() {
		let associations = [
			TemplateAssociation::new("first", [Template::ActiveDirectory]),
			TemplateAssociation::new("second", [Template::LocalStore]),
		];
		// Both match with one template; declaration order decides
		let set = TemplateSet::new([Template::ActiveDirectory, Template::LocalStore]);
		assert_eq!(resolve(&associations, &set), Some(&"first"));
	}

	#[test]
	fn test_resolve_deterministic() {
		let associations = [
			TemplateAssociation::new("a", [Template::Ds389]),
			TemplateAssociation::new("b", []),
		];
		let set = TemplateSet::new([Template::Ds389, Template::DbStore]);
		let first = resolve(&associations, &set);
		for _ in 0..16 {
			assert_eq!(resolve(&associations, &set), first);
		}
	}

	#[test]
	fn test_resolve_fallback_unreachable_with_catch_all() {
		// Whenever a zero-template association is declared, the match loop
		// finds it at size zero for every possible complete template set, so
		// the first-association fallback can never be taken.
		let associations = [
			TemplateAssociation::new("specific", [Template::Mysql]),
			TemplateAssociation::new("catch-all", []),
		];
		for ldap in [
			Template::GenericLdap,
			Template::ActiveDirectory,
			Template::OpenLdap,
			Template::Ds389,
		] {
			for store in [Template::LocalStore, Template::LdapStore, Template::DbStore] {
				for db in [Template::GenericDb, Template::Postgres, Template::Mysql] {
					let set = TemplateSet::new([ldap, store, db]);
					let resolved = resolve(&associations, &set);
					// Never the blind fallback: the result is always an
					// association that genuinely matched
					if set.contains(Template::Mysql) {
						assert_eq!(resolved, Some(&"specific"));
					} else {
						assert_eq!(resolved, Some(&"catch-all"));
					}
				}
			}
		}
	}

	#[test]
	fn test_resolve_fallback_without_catch_all() {
		// No zero-template association and nothing matches: the defensive
		// first-association fallback is the only remaining path.
		let associations = [
			TemplateAssociation::new("a", [Template::Postgres]),
			TemplateAssociation::new("b", [Template::Mysql]),
		];
		let set = TemplateSet::new([Template::GenericDb]);
		assert_eq!(resolve(&associations, &set), Some(&"a"));
	}

	#[test]
	fn test_template_set_serde_round_trip() {
		let set = TemplateSet::new([Template::OpenLdap, Template::DbStore]);
		let json = serde_json::to_string(&set).unwrap();
		let back: TemplateSet = serde_json::from_str(&json).unwrap();
		assert_eq!(back, set);
	}
}

// vim: ts=4
