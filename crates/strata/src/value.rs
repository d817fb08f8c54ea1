//! The tagged-union runtime representation of a configured setting value.
//!
//! One variant per setting syntax. Every variant supports native
//! materialization, validation against a setting definition, a deterministic
//! content hash and a locale-aware debug rendering. Password values carry
//! their secure-encoding mode; their material never reaches debug output.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hasher::Hasher;
use crate::schema::types::SettingDefinition;
use crate::secure::SecureMode;
use crate::types::ProfileId;

/// Value syntax of a setting.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Syntax {
	Text,
	TextArray,
	Boolean,
	Numeric,
	Duration,
	Password,
	Form,
	Action,
	Certificate,
	UserPermission,
	Profile,
	File,
}

/// Accepted HTTP methods for action definitions.
const ACTION_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

/// A password-syntax payload together with its secure-encoding mode.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct StoredPassword {
	pub mode: SecureMode,
	value: Box<str>,
}

impl StoredPassword {
	pub fn new(mode: SecureMode, value: impl Into<Box<str>>) -> Self {
		StoredPassword { mode, value: value.into() }
	}

	pub fn empty() -> Self {
		StoredPassword { mode: SecureMode::Encoded, value: "".into() }
	}

	pub fn is_empty(&self) -> bool {
		self.value.is_empty()
	}

	/// Access the raw material. Callers must not let it reach logs or
	/// debug output.
	pub fn expose(&self) -> &str {
		&self.value
	}
}

impl std::fmt::Debug for StoredPassword {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StoredPassword")
			.field("mode", &self.mode)
			.field("value", &"**********")
			.finish()
	}
}

/// One field of a form definition.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
	pub name: Box<str>,
	/// Locale-keyed display labels.
	pub labels: BTreeMap<Box<str>, Box<str>>,
	#[serde(rename = "type")]
	pub ftype: FormFieldType,
	pub required: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormFieldType {
	Text,
	Email,
	Number,
	Checkbox,
	Select,
}

impl FormField {
	/// Label for `locale`, falling back to the primary language subtag, then
	/// "en", then the field name.
	pub fn label_for(&self, locale: &str) -> &str {
		if let Some(label) = self.labels.get(locale) {
			return label;
		}
		if let Some(lang) = locale.split('-').next() {
			if let Some(label) = self.labels.get(lang) {
				return label;
			}
		}
		if let Some(label) = self.labels.get("en") {
			return label;
		}
		&self.name
	}
}

/// One remote call of an action definition.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
	pub name: Box<str>,
	pub method: Box<str>,
	pub url: Box<str>,
	pub body: Option<Box<str>>,
}

/// Matching rule granting a permission to a set of directory users.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermission {
	pub kind: UserPermissionKind,
	pub profile: Option<ProfileId>,
	pub base: Option<Box<str>>,
	pub filter: Box<str>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserPermissionKind {
	LdapQuery,
	LdapGroup,
}

/// An uploaded file payload (name plus base64 content).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
	pub name: Box<str>,
	pub content: Box<str>,
}

impl FileItem {
	/// Approximate decoded size in bytes.
	pub fn size(&self) -> usize {
		self.content.len() / 4 * 3
	}
}

/// The closed union of stored setting values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "syntax", content = "value", rename_all = "camelCase")]
pub enum StoredValue {
	Text(Box<str>),
	TextArray(Vec<Box<str>>),
	Boolean(bool),
	Numeric(i64),
	/// Seconds.
	Duration(i64),
	Password(StoredPassword),
	Form(Vec<FormField>),
	Action(Vec<ActionItem>),
	/// Base64-encoded DER certificates.
	Certificate(Vec<Box<str>>),
	UserPermission(Vec<UserPermission>),
	Profile(Vec<ProfileId>),
	File(Vec<FileItem>),
}

impl StoredValue {
	pub fn syntax(&self) -> Syntax {
		match self {
			StoredValue::Text(_) => Syntax::Text,
			StoredValue::TextArray(_) => Syntax::TextArray,
			StoredValue::Boolean(_) => Syntax::Boolean,
			StoredValue::Numeric(_) => Syntax::Numeric,
			StoredValue::Duration(_) => Syntax::Duration,
			StoredValue::Password(_) => Syntax::Password,
			StoredValue::Form(_) => Syntax::Form,
			StoredValue::Action(_) => Syntax::Action,
			StoredValue::Certificate(_) => Syntax::Certificate,
			StoredValue::UserPermission(_) => Syntax::UserPermission,
			StoredValue::Profile(_) => Syntax::Profile,
			StoredValue::File(_) => Syntax::File,
		}
	}

	/// Get the type name for error messages
	pub fn type_name(&self) -> &'static str {
		match self {
			StoredValue::Text(_) => "text",
			StoredValue::TextArray(_) => "text array",
			StoredValue::Boolean(_) => "boolean",
			StoredValue::Numeric(_) => "numeric",
			StoredValue::Duration(_) => "duration",
			StoredValue::Password(_) => "password",
			StoredValue::Form(_) => "form",
			StoredValue::Action(_) => "action",
			StoredValue::Certificate(_) => "certificate",
			StoredValue::UserPermission(_) => "user permission",
			StoredValue::Profile(_) => "profile",
			StoredValue::File(_) => "file",
		}
	}

	/// Whether the value counts as unset for required-setting validation.
	pub fn is_empty_value(&self) -> bool {
		match self {
			StoredValue::Text(s) => s.is_empty(),
			StoredValue::TextArray(v) => v.is_empty(),
			StoredValue::Boolean(_) | StoredValue::Numeric(_) | StoredValue::Duration(_) => false,
			StoredValue::Password(p) => p.is_empty(),
			StoredValue::Form(v) => v.is_empty(),
			StoredValue::Action(v) => v.is_empty(),
			StoredValue::Certificate(v) => v.is_empty(),
			StoredValue::UserPermission(v) => v.is_empty(),
			StoredValue::Profile(v) => v.is_empty(),
			StoredValue::File(v) => v.is_empty(),
		}
	}

	/// Validation errors of this value against its setting definition.
	/// An empty list means the value is acceptable.
	pub fn validate(&self, def: &SettingDefinition) -> Vec<String> {
		let mut errors = Vec::new();

		if self.syntax() != def.syntax {
			errors.push(format!(
				"syntax mismatch: setting {} expects {:?}, value is {}",
				def.key.as_str(),
				def.syntax,
				self.type_name()
			));
			return errors;
		}

		if def.required && self.is_empty_value() {
			errors.push(format!("setting {} requires a value", def.key.as_str()));
		}

		match self {
			StoredValue::Text(s) => {
				if let Some(pattern) = &def.pattern {
					if !s.is_empty() && !pattern.is_match(s) {
						errors.push(format!("value does not match pattern {}", pattern.as_str()));
					}
				}
			}
			StoredValue::TextArray(values) => {
				if let Some(pattern) = &def.pattern {
					for value in values {
						if !pattern.is_match(value) {
							errors.push(format!(
								"value {} does not match pattern {}",
								value,
								pattern.as_str()
							));
						}
					}
				}
			}
			StoredValue::Duration(seconds) => {
				if *seconds < 0 {
					errors.push("duration must not be negative".to_string());
				}
			}
			StoredValue::Certificate(certs) => {
				for (i, cert) in certs.iter().enumerate() {
					match base64::engine::general_purpose::STANDARD.decode(cert.as_bytes()) {
						Ok(der) => {
							if x509_parser::parse_x509_certificate(&der).is_err() {
								errors.push(format!("certificate {} is not valid DER", i));
							}
						}
						Err(_) => errors.push(format!("certificate {} is not valid base64", i)),
					}
				}
			}
			StoredValue::Form(fields) => {
				let mut seen = std::collections::HashSet::new();
				for field in fields {
					if field.name.is_empty() {
						errors.push("form field with empty name".to_string());
					}
					if !seen.insert(&field.name) {
						errors.push(format!("duplicate form field {}", field.name));
					}
				}
			}
			StoredValue::Action(actions) => {
				for action in actions {
					if action.name.is_empty() || action.url.is_empty() {
						errors.push("action requires a name and a url".to_string());
					}
					if !ACTION_METHODS.contains(&action.method.as_ref()) {
						errors.push(format!("unknown action method {}", action.method));
					}
				}
			}
			StoredValue::UserPermission(permissions) => {
				for permission in permissions {
					if permission.filter.is_empty() {
						errors.push("user permission requires a filter".to_string());
					}
				}
			}
			StoredValue::Profile(ids) => {
				let mut seen = std::collections::HashSet::new();
				for id in ids {
					if id.as_str().is_empty() {
						errors.push("empty profile id".to_string());
					}
					if !seen.insert(id) {
						errors.push(format!("duplicate profile id {}", id));
					}
				}
			}
			StoredValue::File(files) => {
				for file in files {
					if file.name.is_empty() {
						errors.push("file with empty name".to_string());
					}
					if base64::engine::general_purpose::STANDARD
						.decode(file.content.as_bytes())
						.is_err()
					{
						errors.push(format!("file {} content is not valid base64", file.name));
					}
				}
			}
			_ => {}
		}

		errors
	}

	/// Deterministic content hash, used for change detection and security-key
	/// derivation. Structural, not serialization-based, so it cannot fail and
	/// does not depend on encoder details.
	pub fn content_hash(&self) -> Box<str> {
		let mut hasher = Hasher::new();
		hasher.update(self.type_name().as_bytes());
		self.hash_into(&mut hasher);
		hasher.finalize("V")
	}

	fn hash_into(&self, hasher: &mut Hasher) {
		const SEP: &[u8] = b"\x1f";
		match self {
			StoredValue::Text(s) => hasher.update(s.as_bytes()),
			StoredValue::TextArray(values) => {
				for value in values {
					hasher.update(value.as_bytes());
					hasher.update(SEP);
				}
			}
			StoredValue::Boolean(b) => hasher.update(&[u8::from(*b)]),
			StoredValue::Numeric(n) | StoredValue::Duration(n) => {
				hasher.update(&n.to_be_bytes());
			}
			StoredValue::Password(p) => {
				hasher.update(p.expose().as_bytes());
			}
			StoredValue::Form(fields) => {
				for field in fields {
					hasher.update(field.name.as_bytes());
					hasher.update(SEP);
					for (locale, label) in &field.labels {
						hasher.update(locale.as_bytes());
						hasher.update(SEP);
						hasher.update(label.as_bytes());
						hasher.update(SEP);
					}
					hasher.update(format!("{:?}", field.ftype).as_bytes());
					hasher.update(&[u8::from(field.required)]);
					hasher.update(SEP);
				}
			}
			StoredValue::Action(actions) => {
				for action in actions {
					hasher.update(action.name.as_bytes());
					hasher.update(SEP);
					hasher.update(action.method.as_bytes());
					hasher.update(SEP);
					hasher.update(action.url.as_bytes());
					hasher.update(SEP);
					if let Some(body) = &action.body {
						hasher.update(body.as_bytes());
					}
					hasher.update(SEP);
				}
			}
			StoredValue::Certificate(certs) => {
				for cert in certs {
					hasher.update(cert.as_bytes());
					hasher.update(SEP);
				}
			}
			StoredValue::UserPermission(permissions) => {
				for permission in permissions {
					hasher.update(format!("{:?}", permission.kind).as_bytes());
					hasher.update(SEP);
					if let Some(profile) = &permission.profile {
						hasher.update(profile.as_str().as_bytes());
					}
					hasher.update(SEP);
					if let Some(base) = &permission.base {
						hasher.update(base.as_bytes());
					}
					hasher.update(SEP);
					hasher.update(permission.filter.as_bytes());
					hasher.update(SEP);
				}
			}
			StoredValue::Profile(ids) => {
				for id in ids {
					hasher.update(id.as_str().as_bytes());
					hasher.update(SEP);
				}
			}
			StoredValue::File(files) => {
				for file in files {
					hasher.update(file.name.as_bytes());
					hasher.update(SEP);
					hasher.update(file.content.as_bytes());
					hasher.update(SEP);
				}
			}
		}
	}

	/// Human-readable rendering for diagnostics and change logs. Password
	/// material is never included.
	pub fn debug_string(&self, locale: &str) -> String {
		match self {
			StoredValue::Text(s) => s.to_string(),
			StoredValue::TextArray(values) => values.join(";"),
			StoredValue::Boolean(b) => b.to_string(),
			StoredValue::Numeric(n) => n.to_string(),
			StoredValue::Duration(seconds) => format!("{}s", seconds),
			StoredValue::Password(_) => "**********".to_string(),
			StoredValue::Form(fields) => fields
				.iter()
				.map(|f| format!("{} ({:?})", f.label_for(locale), f.ftype))
				.collect::<Vec<_>>()
				.join(", "),
			StoredValue::Action(actions) => actions
				.iter()
				.map(|a| format!("{}: {} {}", a.name, a.method, a.url))
				.collect::<Vec<_>>()
				.join(", "),
			StoredValue::Certificate(certs) => format!("{} certificate(s)", certs.len()),
			StoredValue::UserPermission(permissions) => permissions
				.iter()
				.map(|p| format!("{:?}: {}", p.kind, p.filter))
				.collect::<Vec<_>>()
				.join(", "),
			StoredValue::Profile(ids) => {
				ids.iter().map(ProfileId::as_str).collect::<Vec<_>>().join(";")
			}
			StoredValue::File(files) => files
				.iter()
				.map(|f| format!("{} ({} bytes)", f.name, f.size()))
				.collect::<Vec<_>>()
				.join(", "),
		}
	}

	// Native materialization. `None` signals a syntax/type mismatch, which
	// the read path treats as a programming-contract violation.

	pub fn as_text(&self) -> Option<&str> {
		match self {
			StoredValue::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_text_array(&self) -> Option<&[Box<str>]> {
		match self {
			StoredValue::TextArray(values) => Some(values),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			StoredValue::Boolean(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_long(&self) -> Option<i64> {
		match self {
			StoredValue::Numeric(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_duration(&self) -> Option<std::time::Duration> {
		match self {
			StoredValue::Duration(seconds) => {
				u64::try_from(*seconds).ok().map(std::time::Duration::from_secs)
			}
			_ => None,
		}
	}

	pub fn as_password(&self) -> Option<&StoredPassword> {
		match self {
			StoredValue::Password(p) => Some(p),
			_ => None,
		}
	}

	pub fn as_form(&self) -> Option<&[FormField]> {
		match self {
			StoredValue::Form(fields) => Some(fields),
			_ => None,
		}
	}

	pub fn as_action(&self) -> Option<&[ActionItem]> {
		match self {
			StoredValue::Action(actions) => Some(actions),
			_ => None,
		}
	}

	pub fn as_certificates(&self) -> Option<&[Box<str>]> {
		match self {
			StoredValue::Certificate(certs) => Some(certs),
			_ => None,
		}
	}

	pub fn as_user_permissions(&self) -> Option<&[UserPermission]> {
		match self {
			StoredValue::UserPermission(permissions) => Some(permissions),
			_ => None,
		}
	}

	pub fn as_profiles(&self) -> Option<&[ProfileId]> {
		match self {
			StoredValue::Profile(ids) => Some(ids),
			_ => None,
		}
	}

	pub fn as_files(&self) -> Option<&[FileItem]> {
		match self {
			StoredValue::File(files) => Some(files),
			_ => None,
		}
	}
}


// vim: ts=4
