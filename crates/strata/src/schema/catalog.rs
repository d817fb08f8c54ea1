//! The setting catalog: the closed key enumeration and the declarative
//! registration of every known setting, grouped by functional area.
//!
//! The registry is built once at process start and cached for the process
//! lifetime; a schema that fails integrity validation aborts startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::prelude::*;
use crate::schema::category::{Category, PermissionLevel};
use crate::schema::template::Template;
use crate::schema::types::{Flag, FrozenSettingRegistry, SettingDefinition, SettingRegistry};
use crate::value::{
	FormField, FormFieldType, StoredValue, Syntax,
};

/// Closed enumeration of every known setting.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum SettingKey {
	// General
	SiteUrl,
	InstanceName,
	KnownLocales,
	IdleTimeout,
	// Logging
	LogLevel,
	LogRetentionDays,
	// Security
	TrustedCertificates,
	SigningKey,
	SessionMaxLifetime,
	LegacyTokenSupport,
	// Database
	DbConnectionUrl,
	DbUsername,
	DbPassword,
	// Email servers
	EmailServerList,
	SmtpHost,
	SmtpPort,
	SmtpUsername,
	SmtpPassword,
	EmailFromAddress,
	// LDAP directories
	LdapProfileList,
	LdapServerUrls,
	LdapProxyDn,
	LdapProxyPassword,
	LdapBaseDn,
	LdapUsernameAttribute,
	LdapUserObjectClass,
	LdapConnectTimeout,
	LdapCertificates,
	// Policies
	AdminPermission,
	ResponseStorage,
	ProfileUpdateForm,
	ProvisioningActions,
	// User interface
	UiTheme,
	UiLogoImage,
}

impl SettingKey {
	pub const ALL: &'static [SettingKey] = &[
		SettingKey::SiteUrl,
		SettingKey::InstanceName,
		SettingKey::KnownLocales,
		SettingKey::IdleTimeout,
		SettingKey::LogLevel,
		SettingKey::LogRetentionDays,
		SettingKey::TrustedCertificates,
		SettingKey::SigningKey,
		SettingKey::SessionMaxLifetime,
		SettingKey::LegacyTokenSupport,
		SettingKey::DbConnectionUrl,
		SettingKey::DbUsername,
		SettingKey::DbPassword,
		SettingKey::EmailServerList,
		SettingKey::SmtpHost,
		SettingKey::SmtpPort,
		SettingKey::SmtpUsername,
		SettingKey::SmtpPassword,
		SettingKey::EmailFromAddress,
		SettingKey::LdapProfileList,
		SettingKey::LdapServerUrls,
		SettingKey::LdapProxyDn,
		SettingKey::LdapProxyPassword,
		SettingKey::LdapBaseDn,
		SettingKey::LdapUsernameAttribute,
		SettingKey::LdapUserObjectClass,
		SettingKey::LdapConnectTimeout,
		SettingKey::LdapCertificates,
		SettingKey::AdminPermission,
		SettingKey::ResponseStorage,
		SettingKey::ProfileUpdateForm,
		SettingKey::ProvisioningActions,
		SettingKey::UiTheme,
		SettingKey::UiLogoImage,
	];

	/// Dot-separated stable key, used in persistence and diagnostics.
	pub fn as_str(self) -> &'static str {
		match self {
			SettingKey::SiteUrl => "general.site_url",
			SettingKey::InstanceName => "general.instance_name",
			SettingKey::KnownLocales => "general.known_locales",
			SettingKey::IdleTimeout => "general.idle_timeout",
			SettingKey::LogLevel => "logging.level",
			SettingKey::LogRetentionDays => "logging.retention_days",
			SettingKey::TrustedCertificates => "security.trusted_certificates",
			SettingKey::SigningKey => "security.signing_key",
			SettingKey::SessionMaxLifetime => "security.session_max_lifetime",
			SettingKey::LegacyTokenSupport => "security.legacy_token_support",
			SettingKey::DbConnectionUrl => "database.connection_url",
			SettingKey::DbUsername => "database.username",
			SettingKey::DbPassword => "database.password",
			SettingKey::EmailServerList => "email.profile_list",
			SettingKey::SmtpHost => "email.smtp_host",
			SettingKey::SmtpPort => "email.smtp_port",
			SettingKey::SmtpUsername => "email.smtp_username",
			SettingKey::SmtpPassword => "email.smtp_password",
			SettingKey::EmailFromAddress => "email.from_address",
			SettingKey::LdapProfileList => "ldap.profile_list",
			SettingKey::LdapServerUrls => "ldap.server_urls",
			SettingKey::LdapProxyDn => "ldap.proxy_dn",
			SettingKey::LdapProxyPassword => "ldap.proxy_password",
			SettingKey::LdapBaseDn => "ldap.base_dn",
			SettingKey::LdapUsernameAttribute => "ldap.username_attribute",
			SettingKey::LdapUserObjectClass => "ldap.user_object_class",
			SettingKey::LdapConnectTimeout => "ldap.connect_timeout",
			SettingKey::LdapCertificates => "ldap.certificates",
			SettingKey::AdminPermission => "policy.admin_permission",
			SettingKey::ResponseStorage => "policy.response_storage",
			SettingKey::ProfileUpdateForm => "policy.profile_update_form",
			SettingKey::ProvisioningActions => "policy.provisioning_actions",
			SettingKey::UiTheme => "ui.theme",
			SettingKey::UiLogoImage => "ui.logo_image",
		}
	}

	pub fn from_key_str(key: &str) -> Option<SettingKey> {
		SettingKey::ALL.iter().copied().find(|k| k.as_str() == key)
	}
}

impl Serialize for SettingKey {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for SettingKey {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let key = Box::<str>::deserialize(deserializer)?;
		SettingKey::from_key_str(&key)
			.ok_or_else(|| serde::de::Error::custom(format!("unknown setting key {}", key)))
	}
}

fn form_field(name: &str, en_label: &str, ftype: FormFieldType, required: bool) -> FormField {
	let mut labels = BTreeMap::new();
	labels.insert(Box::from("en"), Box::from(en_label));
	FormField { name: name.into(), labels, ftype, required }
}

/// Register general and logging settings
fn register_general_settings(registry: &mut SettingRegistry) -> StResult<()> {
	registry.register(
		SettingDefinition::builder(SettingKey::SiteUrl, Syntax::Text, Category::General)
			.label("Site URL")
			.required(true)
			.pattern("^https?://.+")
			.default(StoredValue::Text("".into()))
			.example("https://sso.example.com")
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::InstanceName, Syntax::Text, Category::General)
			.label("Instance Name")
			.default(StoredValue::Text("Strata".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::KnownLocales, Syntax::TextArray, Category::General)
			.label("Known Locales")
			.default(StoredValue::TextArray(vec!["en".into()]))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::IdleTimeout, Syntax::Duration, Category::General)
			.label("Idle Timeout")
			.default(StoredValue::Duration(600))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::LogLevel, Syntax::Text, Category::Logging)
			.label("Log Level")
			.pattern("^(trace|debug|info|warn|error)$")
			.default(StoredValue::Text("info".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::LogRetentionDays, Syntax::Numeric, Category::Logging)
			.label("Log Retention Days")
			.default(StoredValue::Numeric(30))
			.build()?,
	)?;

	Ok(())
}

/// Register security and database settings
fn register_security_settings(registry: &mut SettingRegistry) -> StResult<()> {
	registry.register(
		SettingDefinition::builder(
			SettingKey::TrustedCertificates,
			Syntax::Certificate,
			Category::Security,
		)
		.label("Trusted Certificates")
		.default(StoredValue::Certificate(Vec::new()))
		.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::SigningKey, Syntax::Password, Category::Security)
			.label("Signing Key")
			.hidden(true)
			.permission(PermissionLevel::System)
			.flag(Flag::NoDefault)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(
			SettingKey::SessionMaxLifetime,
			Syntax::Duration,
			Category::Security,
		)
		.label("Maximum Session Lifetime")
		.default(StoredValue::Duration(3600))
		.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(
			SettingKey::LegacyTokenSupport,
			Syntax::Boolean,
			Category::Security,
		)
		.label("Legacy Token Support")
		.flag(Flag::Deprecated)
		.default(StoredValue::Boolean(false))
		.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::DbConnectionUrl, Syntax::Text, Category::Database)
			.label("Database Connection URL")
			.default_for(
				StoredValue::Text("postgres://localhost:5432/strata".into()),
				[Template::Postgres],
			)
			.default_for(
				StoredValue::Text("mysql://localhost:3306/strata".into()),
				[Template::Mysql],
			)
			.default(StoredValue::Text("".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::DbUsername, Syntax::Text, Category::Database)
			.label("Database Username")
			.default(StoredValue::Text("".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::DbPassword, Syntax::Password, Category::Database)
			.label("Database Password")
			.flag(Flag::NoDefault)
			.build()?,
	)?;

	Ok(())
}

/// Register email server settings (profiled: one profile per server)
fn register_email_settings(registry: &mut SettingRegistry) -> StResult<()> {
	registry.register(
		SettingDefinition::builder(SettingKey::EmailServerList, Syntax::Profile, Category::Email)
			.label("Email Server Profiles")
			.hidden(true)
			.default(StoredValue::Profile(vec![ProfileId::new("default")]))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::SmtpHost, Syntax::Text, Category::Email)
			.label("SMTP Host")
			.required(true)
			.default(StoredValue::Text("".into()))
			.example("smtp.example.com")
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::SmtpPort, Syntax::Numeric, Category::Email)
			.label("SMTP Port")
			.default(StoredValue::Numeric(25))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::SmtpUsername, Syntax::Text, Category::Email)
			.label("SMTP Username")
			.default(StoredValue::Text("".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::SmtpPassword, Syntax::Password, Category::Email)
			.label("SMTP Password")
			.flag(Flag::NoDefault)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::EmailFromAddress, Syntax::Text, Category::Email)
			.label("From Address")
			.flag(Flag::MacroSupport)
			.default(StoredValue::Text("noreply@example.com".into()))
			.build()?,
	)?;

	Ok(())
}

/// Register LDAP directory settings (profiled: one profile per directory)
fn register_ldap_settings(registry: &mut SettingRegistry) -> StResult<()> {
	registry.register(
		SettingDefinition::builder(SettingKey::LdapProfileList, Syntax::Profile, Category::Ldap)
			.label("LDAP Profiles")
			.hidden(true)
			.default(StoredValue::Profile(vec![ProfileId::new("default")]))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::LdapServerUrls, Syntax::TextArray, Category::Ldap)
			.label("LDAP Server URLs")
			.required(true)
			.pattern("^ldaps?://.+")
			.default(StoredValue::TextArray(Vec::new()))
			.example_for("ldaps://dc.example.com:636", [Template::ActiveDirectory])
			.example("ldap://ldap.example.com:389")
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::LdapProxyDn, Syntax::Text, Category::Ldap)
			.label("Proxy Account DN")
			.required(true)
			.default(StoredValue::Text("".into()))
			.example_for(
				"CN=Strata Service,CN=Users,DC=example,DC=com",
				[Template::ActiveDirectory],
			)
			.example("cn=admin,dc=example,dc=com")
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::LdapProxyPassword, Syntax::Password, Category::Ldap)
			.label("Proxy Account Password")
			.flag(Flag::NoDefault)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::LdapBaseDn, Syntax::TextArray, Category::Ldap)
			.label("Base Contexts")
			.required(true)
			.default(StoredValue::TextArray(Vec::new()))
			.example("ou=people,dc=example,dc=com")
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::LdapUsernameAttribute, Syntax::Text, Category::Ldap)
			.label("Username Attribute")
			.default_for(
				StoredValue::Text("sAMAccountName".into()),
				[Template::ActiveDirectory],
			)
			.default(StoredValue::Text("uid".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::LdapUserObjectClass, Syntax::Text, Category::Ldap)
			.label("User Object Class")
			.default_for(StoredValue::Text("user".into()), [Template::ActiveDirectory])
			.default(StoredValue::Text("inetOrgPerson".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::LdapConnectTimeout, Syntax::Duration, Category::Ldap)
			.label("Connect Timeout")
			.default(StoredValue::Duration(10))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::LdapCertificates, Syntax::Certificate, Category::Ldap)
			.label("Directory Certificates")
			.default(StoredValue::Certificate(Vec::new()))
			.build()?,
	)?;

	Ok(())
}

/// Register policy settings
fn register_policy_settings(registry: &mut SettingRegistry) -> StResult<()> {
	registry.register(
		SettingDefinition::builder(
			SettingKey::AdminPermission,
			Syntax::UserPermission,
			Category::Policy,
		)
		.label("Administrator Permission")
		.default(StoredValue::UserPermission(Vec::new()))
		.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::ResponseStorage, Syntax::Text, Category::Policy)
			.label("Response Storage Backend")
			.pattern("^(local|ldap|db)$")
			.default_for(StoredValue::Text("ldap".into()), [Template::LdapStore])
			.default_for(StoredValue::Text("db".into()), [Template::DbStore])
			.default(StoredValue::Text("local".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::ProfileUpdateForm, Syntax::Form, Category::Policy)
			.label("Profile Update Form")
			.default(StoredValue::Form(vec![
				form_field("username", "Username", FormFieldType::Text, true),
				form_field("mail", "Email Address", FormFieldType::Email, false),
			]))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(
			SettingKey::ProvisioningActions,
			Syntax::Action,
			Category::Policy,
		)
		.label("Provisioning Actions")
		.default(StoredValue::Action(Vec::new()))
		.build()?,
	)?;

	Ok(())
}

/// Register user interface settings
fn register_ui_settings(registry: &mut SettingRegistry) -> StResult<()> {
	registry.register(
		SettingDefinition::builder(SettingKey::UiTheme, Syntax::Text, Category::Ui)
			.label("Theme")
			.permission(PermissionLevel::User)
			.level(2)
			.default(StoredValue::Text("default".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(SettingKey::UiLogoImage, Syntax::File, Category::Ui)
			.label("Logo Image")
			.level(2)
			.default(StoredValue::File(Vec::new()))
			.build()?,
	)?;

	Ok(())
}

fn build_registry() -> StResult<FrozenSettingRegistry> {
	let mut registry = SettingRegistry::new();
	register_general_settings(&mut registry)?;
	register_security_settings(&mut registry)?;
	register_email_settings(&mut registry)?;
	register_ldap_settings(&mut registry)?;
	register_policy_settings(&mut registry)?;
	register_ui_settings(&mut registry)?;
	registry.freeze()
}

/// The process-wide frozen registry. Built on first access; an inconsistent
/// schema aborts the process rather than serving a partial catalog.
pub fn registry() -> &'static FrozenSettingRegistry {
	static REGISTRY: OnceLock<FrozenSettingRegistry> = OnceLock::new();
	REGISTRY
		.get_or_init(|| build_registry().expect("FATAL: settings schema failed integrity validation"))
}


// vim: ts=4
