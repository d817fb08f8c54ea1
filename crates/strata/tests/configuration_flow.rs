//! End-to-end flow over the configuration core: build a snapshot, read
//! through scoped readers, protect secrets under derived domain keys.

use std::sync::Arc;

use strata::schema::{SettingKey, Template, TemplateSet};
use strata::secure::{self, SecureMode, SecurityKey};
use strata::store::{BoundProfile, ProfileKind, SettingReader, StorageKey, StoredConfiguration};
use strata::types::{DomainId, ProfileId};
use strata::value::{StoredPassword, StoredValue};

fn build_config() -> Arc<StoredConfiguration> {
	let mut builder = StoredConfiguration::builder();
	builder.set_template_set(DomainId(1), TemplateSet::new([Template::ActiveDirectory]));
	builder.set_template_set(DomainId(2), TemplateSet::new([Template::OpenLdap]));

	builder
		.store_value(
			StorageKey::new(SettingKey::InstanceName, None, DomainId::SYSTEM),
			StoredValue::Text("Corp SSO".into()),
		)
		.unwrap();
	builder
		.store_value(
			StorageKey::new(SettingKey::LdapProfileList, None, DomainId(1)),
			StoredValue::Profile(vec!["corp".into()]),
		)
		.unwrap();
	builder
		.store_value(
			StorageKey::new(SettingKey::LdapServerUrls, Some("corp".into()), DomainId(1)),
			StoredValue::TextArray(vec!["ldaps://dc1.corp.example.com:636".into()]),
		)
		.unwrap();
	builder.set_localized_text("login.title", "en", "Sign in");

	Arc::new(builder.build())
}

#[test]
fn test_scoped_reads_across_contexts() {
	let config = build_config();

	let system = SettingReader::system(config.clone());
	assert_eq!(system.read_string(SettingKey::InstanceName).unwrap().as_ref(), "Corp SSO");

	let corp = SettingReader::for_profile(config.clone(), "corp".into(), DomainId(1));
	assert_eq!(
		corp.read_string_array(SettingKey::LdapServerUrls).unwrap(),
		vec![Box::<str>::from("ldaps://dc1.corp.example.com:636")]
	);
	// Template-driven default for the unset attribute setting
	assert_eq!(
		corp.read_string(SettingKey::LdapUsernameAttribute).unwrap().as_ref(),
		"sAMAccountName"
	);

	// Same setting under the OpenLDAP domain resolves the generic default
	let other = SettingReader::for_profile(config.clone(), "default".into(), DomainId(2));
	assert_eq!(other.read_string(SettingKey::LdapUsernameAttribute).unwrap().as_ref(), "uid");

	assert_eq!(system.read_localized_string("login.title", "en-US").as_deref(), Some("Sign in"));
}

#[test]
fn test_profile_enumeration_follows_stored_list() {
	let config = build_config();
	let reader = SettingReader::for_domain(config, DomainId(1));

	let profiles = reader.profiles(ProfileKind::Ldap, BoundProfile::factory).unwrap();
	assert_eq!(profiles.len(), 1);
	assert!(profiles.contains_key(&ProfileId::new("corp")));
}

#[test]
fn test_domain_keys_are_isolated_and_content_bound() {
	let config = build_config();
	let app_key = SecurityKey::from_phrase("application-wide key");

	let key1 = secure::domain_key(&app_key, DomainId(1), &config);
	let key2 = secure::domain_key(&app_key, DomainId(2), &config);
	assert_ne!(key1, key2);

	// Changing a setting in domain 1 changes its derived key and leaves
	// domain 2's untouched
	let mut edit = config.to_builder();
	edit.store_value(
		StorageKey::new(SettingKey::UiTheme, None, DomainId(1)),
		StoredValue::Text("dark".into()),
	)
	.unwrap();
	let updated = edit.build();

	assert_ne!(secure::domain_key(&app_key, DomainId(1), &updated), key1);
	assert_eq!(secure::domain_key(&app_key, DomainId(2), &updated), key2);
}

#[test]
fn test_secret_round_trip_under_domain_key() {
	let config = build_config();
	let app_key = SecurityKey::from_phrase("application-wide key");
	let domain_key = secure::domain_key(&app_key, DomainId(1), &config);

	let encoded = secure::encode("ldap-proxy-secret", SecureMode::Encoded, &domain_key).unwrap();

	let mut edit = config.to_builder();
	edit.store_value(
		StorageKey::new(SettingKey::LdapProxyPassword, Some("corp".into()), DomainId(1)),
		StoredValue::Password(StoredPassword::new(SecureMode::Encoded, encoded)),
	)
	.unwrap();
	let updated = Arc::new(edit.build());

	let reader = SettingReader::for_profile(updated, "corp".into(), DomainId(1));
	let decoded =
		reader.read_password_value(SettingKey::LdapProxyPassword, &domain_key).unwrap();
	assert_eq!(decoded.as_deref(), Some("ldap-proxy-secret"));

	// The application key alone cannot decode the domain-scoped secret
	let raw = reader.read_password(SettingKey::LdapProxyPassword).unwrap();
	assert!(secure::decode(raw.expose(), SecureMode::Encoded, &app_key).is_err());
}

#[test]
fn test_value_hash_stable_across_reload() {
	let a = build_config();
	let b = build_config();
	assert_eq!(a.value_hash(DomainId(1)), b.value_hash(DomainId(1)));

	// A rebuild without value changes bumps the epoch but keeps the scope
	// hash stable, so reload-without-change does not invalidate anything
	let rebuilt = Arc::new(a.to_builder().build());
	assert_ne!(rebuilt.epoch(), a.epoch());
	assert_eq!(
		SettingReader::for_domain(rebuilt, DomainId(1)).value_hash(),
		SettingReader::for_domain(a, DomainId(1)).value_hash()
	);
}
