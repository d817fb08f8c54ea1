//! The stored configuration snapshot and its copy-on-write builder.
//!
//! A snapshot is immutable once built; edits go through `to_builder()` and
//! produce a new snapshot with a bumped epoch, so concurrent readers holding
//! a snapshot reference never observe torn state.

use itertools::Itertools;
use lru::LruCache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::hasher::Hasher;
use crate::prelude::*;
use crate::schema::{SettingKey, TemplateSet, registry};
use crate::store::reader::{ProfileKind, ProfileMap};
use crate::value::StoredValue;

const BUNDLE_CACHE_SIZE: usize = 128;

/// Storage coordinate of one value: setting, optional profile, domain.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey {
	pub setting: SettingKey,
	pub profile: Option<ProfileId>,
	pub domain: DomainId,
}

impl StorageKey {
	pub fn new(setting: SettingKey, profile: Option<ProfileId>, domain: DomainId) -> Self {
		StorageKey { setting, profile, domain }
	}

	/// Stable textual form, used in hashing and diagnostics.
	pub fn canonical(&self) -> String {
		match &self.profile {
			Some(profile) => format!("{}/{}/{}", self.domain, self.setting.as_str(), profile),
			None => format!("{}/{}", self.domain, self.setting.as_str()),
		}
	}
}

/// Free-form configuration properties carried next to the values.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum ConfigProperty {
	/// Monotonic change counter, bumped on every build.
	Epoch,
	/// Whether an editing layer may modify this configuration.
	Editable,
	/// Unix timestamp of the last build.
	SaveTime,
}

impl ConfigProperty {
	pub fn as_str(self) -> &'static str {
		match self {
			ConfigProperty::Epoch => "epoch",
			ConfigProperty::Editable => "editable",
			ConfigProperty::SaveTime => "save_time",
		}
	}
}

/// An immutable configuration snapshot.
pub struct StoredConfiguration {
	values: HashMap<StorageKey, StoredValue>,
	/// bundle key -> locale -> text
	bundles: HashMap<Box<str>, HashMap<Box<str>, Box<str>>>,
	properties: HashMap<ConfigProperty, Box<str>>,
	templates: HashMap<DomainId, TemplateSet>,
	default_templates: TemplateSet,

	// Memoize-once caches. Pure functions of the immutable snapshot, so
	// duplicate computation under concurrent first access is acceptable.
	profile_cache: RwLock<HashMap<(ProfileKind, DomainId), Arc<ProfileMap>>>,
	bundle_cache: RwLock<LruCache<(Box<str>, Box<str>), Option<Box<str>>>>,
}

impl StoredConfiguration {
	pub fn builder() -> StoredConfigurationBuilder {
		StoredConfigurationBuilder::new()
	}

	pub fn value(&self, key: &StorageKey) -> Option<&StoredValue> {
		self.values.get(key)
	}

	pub fn values_for_domain(
		&self,
		domain: DomainId,
	) -> impl Iterator<Item = (&StorageKey, &StoredValue)> {
		self.values.iter().filter(move |(key, _)| key.domain == domain)
	}

	/// The active template set of `domain`, falling back to the
	/// configuration-wide default selection.
	pub fn template_set(&self, domain: DomainId) -> &TemplateSet {
		self.templates.get(&domain).unwrap_or(&self.default_templates)
	}

	pub fn property(&self, property: ConfigProperty) -> Option<&str> {
		self.properties.get(&property).map(AsRef::as_ref)
	}

	pub fn epoch(&self) -> u64 {
		self.property(ConfigProperty::Epoch).and_then(|e| e.parse().ok()).unwrap_or(0)
	}

	pub fn editable(&self) -> bool {
		self.property(ConfigProperty::Editable) != Some("false")
	}

	/// Content hash of one domain's scope: the domain id concatenated with
	/// every owned value's content hash in stable key order. Stable across
	/// construction order; used for change detection and security-key
	/// derivation.
	pub fn value_hash(&self, domain: DomainId) -> Box<str> {
		let mut hasher = Hasher::new();
		hasher.update(domain.to_string().as_bytes());
		for (key, value) in self
			.values_for_domain(domain)
			.sorted_by(|(a, _), (b, _)| a.cmp(b))
		{
			hasher.update(key.canonical().as_bytes());
			hasher.update(value.content_hash().as_bytes());
		}
		hasher.finalize("C")
	}

	/// All locale overrides of one bundle.
	pub fn localized_bundle(&self, bundle: &str) -> Option<&HashMap<Box<str>, Box<str>>> {
		self.bundles.get(bundle)
	}

	/// Localized text override for `bundle` under `locale`, with fallback to
	/// the primary language subtag and then "en". Resolutions are cached.
	pub fn localized_text(&self, bundle: &str, locale: &str) -> Option<Box<str>> {
		let cache_key = (Box::<str>::from(bundle), Box::<str>::from(locale));
		if let Some(cached) = self.bundle_cache.write().get(&cache_key) {
			return cached.clone();
		}

		let resolved = self.bundles.get(bundle).and_then(|texts| {
			if let Some(text) = texts.get(locale) {
				return Some(text.clone());
			}
			if let Some(lang) = locale.split('-').next() {
				if let Some(text) = texts.get(lang) {
					return Some(text.clone());
				}
			}
			texts.get("en").cloned()
		});

		self.bundle_cache.write().put(cache_key, resolved.clone());
		resolved
	}

	/// Memoized profile-map access for the reader. The first computed map
	/// wins; recomputation by concurrent first readers is idempotent.
	pub(crate) fn profile_map_cached(
		&self,
		kind: ProfileKind,
		domain: DomainId,
		compute: impl FnOnce() -> StResult<ProfileMap>,
	) -> StResult<Arc<ProfileMap>> {
		if let Some(map) = self.profile_cache.read().get(&(kind, domain)) {
			return Ok(map.clone());
		}
		let map = Arc::new(compute()?);
		self.profile_cache.write().entry((kind, domain)).or_insert_with(|| map.clone());
		Ok(map)
	}

	pub fn to_builder(&self) -> StoredConfigurationBuilder {
		StoredConfigurationBuilder {
			values: self.values.clone(),
			bundles: self.bundles.clone(),
			properties: self.properties.clone(),
			templates: self.templates.clone(),
			default_templates: self.default_templates.clone(),
			modified: BTreeSet::new(),
		}
	}
}

impl std::fmt::Debug for StoredConfiguration {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StoredConfiguration")
			.field("epoch", &self.epoch())
			.field("values", &self.values.len())
			.field("bundles", &self.bundles.len())
			.finish()
	}
}

/// Mutable builder producing new configuration snapshots.
pub struct StoredConfigurationBuilder {
	values: HashMap<StorageKey, StoredValue>,
	bundles: HashMap<Box<str>, HashMap<Box<str>, Box<str>>>,
	properties: HashMap<ConfigProperty, Box<str>>,
	templates: HashMap<DomainId, TemplateSet>,
	default_templates: TemplateSet,
	modified: BTreeSet<StorageKey>,
}

impl StoredConfigurationBuilder {
	pub fn new() -> Self {
		Self {
			values: HashMap::new(),
			bundles: HashMap::new(),
			properties: HashMap::new(),
			templates: HashMap::new(),
			default_templates: TemplateSet::default(),
			modified: BTreeSet::new(),
		}
	}

	/// Store a value, validating it against its definition. Storing a value
	/// of the wrong syntax is a contract violation; content problems are
	/// reported as validation errors.
	pub fn store_value(&mut self, key: StorageKey, value: StoredValue) -> StResult<()> {
		let def = registry().definition(key.setting);
		if value.syntax() != def.syntax {
			return Err(Error::TypeMismatch(format!(
				"setting {} expects {:?}, got {}",
				key.setting.as_str(),
				def.syntax,
				value.type_name()
			)));
		}
		let errors = value.validate(def);
		if !errors.is_empty() {
			return Err(Error::ValidationError(errors.join("; ")));
		}

		self.modified.insert(key.clone());
		self.values.insert(key, value);
		Ok(())
	}

	/// Remove a stored value; reads fall back to the resolved default.
	pub fn reset_value(&mut self, key: &StorageKey) {
		if self.values.remove(key).is_some() {
			self.modified.insert(key.clone());
		}
	}

	pub fn set_localized_text(
		&mut self,
		bundle: impl Into<Box<str>>,
		locale: impl Into<Box<str>>,
		text: impl Into<Box<str>>,
	) {
		self.bundles.entry(bundle.into()).or_default().insert(locale.into(), text.into());
	}

	pub fn set_property(&mut self, property: ConfigProperty, value: impl Into<Box<str>>) {
		self.properties.insert(property, value.into());
	}

	pub fn set_template_set(&mut self, domain: DomainId, set: TemplateSet) {
		self.templates.insert(domain, set);
	}

	pub fn set_default_templates(&mut self, set: TemplateSet) {
		self.default_templates = set;
	}

	/// Keys changed since this builder was created. The persistence layer
	/// uses this for change tracking.
	pub fn modified_keys(&self) -> impl Iterator<Item = &StorageKey> {
		self.modified.iter()
	}

	/// Produce the new immutable snapshot, bumping the epoch.
	pub fn build(mut self) -> StoredConfiguration {
		let epoch: u64 =
			self.properties.get(&ConfigProperty::Epoch).and_then(|e| e.parse().ok()).unwrap_or(0);
		self.properties.insert(ConfigProperty::Epoch, (epoch + 1).to_string().into());
		self.properties.insert(ConfigProperty::SaveTime, Timestamp::now().to_string().into());

		info!(
			"Building configuration snapshot (epoch {}, {} values, {} modified)",
			epoch + 1,
			self.values.len(),
			self.modified.len()
		);

		StoredConfiguration {
			values: self.values,
			bundles: self.bundles,
			properties: self.properties,
			templates: self.templates,
			default_templates: self.default_templates,
			profile_cache: RwLock::new(HashMap::new()),
			bundle_cache: RwLock::new(LruCache::new(
				NonZeroUsize::new(BUNDLE_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
			)),
		}
	}
}

impl Default for StoredConfigurationBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::Template;

	fn domain_key(setting: SettingKey, domain: u32) -> StorageKey {
		StorageKey::new(setting, None, DomainId(domain))
	}

	#[test]
	fn test_store_and_read_back() {
		let mut builder = StoredConfiguration::builder();
		builder
			.store_value(
				domain_key(SettingKey::UiTheme, 3),
				StoredValue::Text("dark".into()),
			)
			.unwrap();
		let config = builder.build();
		assert_eq!(
			config.value(&domain_key(SettingKey::UiTheme, 3)),
			Some(&StoredValue::Text("dark".into()))
		);
		assert_eq!(config.value(&domain_key(SettingKey::UiTheme, 4)), None);
	}

	#[test]
	fn test_store_wrong_syntax_is_contract_violation() {
		let mut builder = StoredConfiguration::builder();
		let err = builder
			.store_value(domain_key(SettingKey::UiTheme, 1), StoredValue::Boolean(true))
			.unwrap_err();
		assert!(matches!(err, Error::TypeMismatch(_)));
	}

	#[test]
	fn test_store_invalid_value_is_validation_error() {
		let mut builder = StoredConfiguration::builder();
		let err = builder
			.store_value(
				StorageKey::new(SettingKey::LdapServerUrls, Some("default".into()), DomainId(1)),
				StoredValue::TextArray(vec!["not-an-ldap-url".into()]),
			)
			.unwrap_err();
		assert!(matches!(err, Error::ValidationError(_)));
	}

	#[test]
	fn test_epoch_bumps_on_build() {
		let config = StoredConfiguration::builder().build();
		assert_eq!(config.epoch(), 1);
		let config = config.to_builder().build();
		assert_eq!(config.epoch(), 2);
	}

	#[test]
	fn test_copy_on_write_leaves_snapshot_untouched() {
		let mut builder = StoredConfiguration::builder();
		builder
			.store_value(domain_key(SettingKey::UiTheme, 1), StoredValue::Text("dark".into()))
			.unwrap();
		let original = builder.build();

		let mut edit = original.to_builder();
		edit.store_value(domain_key(SettingKey::UiTheme, 1), StoredValue::Text("light".into()))
			.unwrap();
		let updated = edit.build();

		assert_eq!(
			original.value(&domain_key(SettingKey::UiTheme, 1)),
			Some(&StoredValue::Text("dark".into()))
		);
		assert_eq!(
			updated.value(&domain_key(SettingKey::UiTheme, 1)),
			Some(&StoredValue::Text("light".into()))
		);
	}

	#[test]
	fn test_modified_key_tracking() {
		let mut builder = StoredConfiguration::builder();
		builder
			.store_value(domain_key(SettingKey::UiTheme, 1), StoredValue::Text("dark".into()))
			.unwrap();
		let config = builder.build();

		let mut edit = config.to_builder();
		assert_eq!(edit.modified_keys().count(), 0);
		edit.reset_value(&domain_key(SettingKey::UiTheme, 1));
		edit.store_value(
			domain_key(SettingKey::InstanceName, 0),
			StoredValue::Text("Corp SSO".into()),
		)
		.unwrap();
		assert_eq!(edit.modified_keys().count(), 2);
	}

	#[test]
	fn test_value_hash_stable_across_construction_order() {
		let mut a = StoredConfiguration::builder();
		a.store_value(domain_key(SettingKey::UiTheme, 2), StoredValue::Text("dark".into()))
			.unwrap();
		a.store_value(
			domain_key(SettingKey::ResponseStorage, 2),
			StoredValue::Text("db".into()),
		)
		.unwrap();

		let mut b = StoredConfiguration::builder();
		b.store_value(
			domain_key(SettingKey::ResponseStorage, 2),
			StoredValue::Text("db".into()),
		)
		.unwrap();
		b.store_value(domain_key(SettingKey::UiTheme, 2), StoredValue::Text("dark".into()))
			.unwrap();

		assert_eq!(a.build().value_hash(DomainId(2)), b.build().value_hash(DomainId(2)));
	}

	#[test]
	fn test_value_hash_scoped_to_domain() {
		let mut builder = StoredConfiguration::builder();
		builder
			.store_value(domain_key(SettingKey::UiTheme, 1), StoredValue::Text("dark".into()))
			.unwrap();
		builder
			.store_value(domain_key(SettingKey::UiTheme, 2), StoredValue::Text("dark".into()))
			.unwrap();
		let config = builder.build();

		assert_ne!(config.value_hash(DomainId(1)), config.value_hash(DomainId(2)));

		// A change in domain 2 leaves domain 1's hash alone
		let before = config.value_hash(DomainId(1));
		let mut edit = config.to_builder();
		edit.store_value(domain_key(SettingKey::UiTheme, 2), StoredValue::Text("light".into()))
			.unwrap();
		let updated = edit.build();
		assert_eq!(updated.value_hash(DomainId(1)), before);
		assert_ne!(updated.value_hash(DomainId(2)), config.value_hash(DomainId(2)));
	}

	#[test]
	fn test_template_set_per_domain() {
		let mut builder = StoredConfiguration::builder();
		builder.set_template_set(DomainId(5), TemplateSet::new([Template::ActiveDirectory]));
		let config = builder.build();

		assert!(config.template_set(DomainId(5)).contains(Template::ActiveDirectory));
		assert!(config.template_set(DomainId(6)).contains(Template::GenericLdap));
	}

	#[test]
	fn test_localized_text_fallback() {
		let mut builder = StoredConfiguration::builder();
		builder.set_localized_text("login.title", "en", "Sign in");
		builder.set_localized_text("login.title", "de", "Anmelden");
		let config = builder.build();

		assert_eq!(config.localized_text("login.title", "de-AT").as_deref(), Some("Anmelden"));
		assert_eq!(config.localized_text("login.title", "fr").as_deref(), Some("Sign in"));
		assert_eq!(config.localized_text("missing.bundle", "en"), None);
		// Cached resolution returns the same answer
		assert_eq!(config.localized_text("login.title", "de-AT").as_deref(), Some("Anmelden"));
	}
}

// vim: ts=4
