//! Field-level input validation.
//!
//! Every validator returns a `Result`; failures are collected per field into
//! [`FieldErrors`] and rendered as `{"field": ["message", ...]}`.

use std::collections::BTreeMap;

use serde::Serialize;

use huddle_types::api::{LoginRequest, RegisterRequest};

pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const PASSWORD_MAX_CHARS: usize = 128;
pub const MESSAGE_MAX_CHARS: usize = 2000;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

#[derive(Debug, Clone, Copy)]
struct Rules {
    trim: bool,
    min_chars: usize,
    max_chars: usize,
}

/// Returns the (possibly trimmed) value if it satisfies `rules`, recording an
/// error for `field` otherwise.
fn check(errors: &mut FieldErrors, field: &str, value: Option<&str>, rules: Rules) -> Option<String> {
    let Some(raw) = value else {
        errors.add(field, REQUIRED);
        return None;
    };

    let value = if rules.trim { raw.trim() } else { raw };
    if value.trim().is_empty() {
        errors.add(field, BLANK);
        return None;
    }

    let len = value.chars().count();
    if len > rules.max_chars {
        errors.add(
            field,
            format!("Ensure this field has no more than {} characters.", rules.max_chars),
        );
        return None;
    }
    if len < rules.min_chars {
        errors.add(
            field,
            format!("Ensure this field has at least {} characters.", rules.min_chars),
        );
        return None;
    }

    Some(value.to_string())
}

const USERNAME_RULES: Rules = Rules { trim: true, min_chars: 1, max_chars: USERNAME_MAX_CHARS };
const PASSWORD_RULES: Rules = Rules {
    trim: false,
    min_chars: PASSWORD_MIN_CHARS,
    max_chars: PASSWORD_MAX_CHARS,
};

/// Validated registration input.
#[derive(Debug)]
pub struct NewMember {
    pub username: String,
    pub password: String,
}

pub fn validate_registration(req: &RegisterRequest) -> Result<NewMember, FieldErrors> {
    let mut errors = FieldErrors::default();
    let username = check(&mut errors, "username", req.username.as_deref(), USERNAME_RULES);
    let password = check(&mut errors, "password", req.password.as_deref(), PASSWORD_RULES);

    match (username, password) {
        (Some(username), Some(password)) => errors.into_result(NewMember { username, password }),
        _ => Err(errors),
    }
}

/// Login only checks presence; length rules would leak nothing useful and
/// would reject accounts created under older limits.
pub fn validate_login(req: &LoginRequest) -> Result<(String, String), FieldErrors> {
    let presence = Rules { trim: false, min_chars: 1, max_chars: usize::MAX };

    let mut errors = FieldErrors::default();
    let username = check(&mut errors, "username", req.username.as_deref(), Rules { trim: true, ..presence });
    let password = check(&mut errors, "password", req.password.as_deref(), presence);

    match (username, password) {
        (Some(username), Some(password)) => errors.into_result((username, password)),
        _ => Err(errors),
    }
}

pub fn validate_username(username: &str) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::default();
    match check(&mut errors, "username", Some(username), USERNAME_RULES) {
        Some(username) => errors.into_result(username),
        None => Err(errors),
    }
}

pub fn validate_message_text(text: Option<&str>) -> Result<String, FieldErrors> {
    let rules = Rules { trim: true, min_chars: 1, max_chars: MESSAGE_MAX_CHARS };

    let mut errors = FieldErrors::default();
    match check(&mut errors, "text", text, rules) {
        Some(text) => errors.into_result(text),
        None => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: Option<&str>, password: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            username: username.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn registration_accepts_valid_input() {
        let member = validate_registration(&register(Some("  alice "), Some("secret1"))).unwrap();
        assert_eq!(member.username, "alice");
        assert_eq!(member.password, "secret1");
    }

    #[test]
    fn registration_reports_every_missing_field() {
        let errors = validate_registration(&register(None, None)).unwrap_err();
        assert_eq!(errors.get("username").unwrap(), [REQUIRED]);
        assert_eq!(errors.get("password").unwrap(), [REQUIRED]);
    }

    #[test]
    fn registration_enforces_password_length() {
        let errors = validate_registration(&register(Some("alice"), Some("12345"))).unwrap_err();
        assert_eq!(
            errors.get("password").unwrap(),
            ["Ensure this field has at least 6 characters."]
        );
        assert!(errors.get("username").is_none());

        let long = "p".repeat(PASSWORD_MAX_CHARS + 1);
        assert!(validate_registration(&register(Some("alice"), Some(&long))).is_err());
    }

    #[test]
    fn username_length_counts_characters() {
        assert!(validate_username(&"é".repeat(USERNAME_MAX_CHARS)).is_ok());

        let errors = validate_username(&"a".repeat(USERNAME_MAX_CHARS + 1)).unwrap_err();
        assert_eq!(
            errors.get("username").unwrap(),
            ["Ensure this field has no more than 150 characters."]
        );
    }

    #[test]
    fn blank_username_rejected() {
        let errors = validate_username("   ").unwrap_err();
        assert_eq!(errors.get("username").unwrap(), [BLANK]);
    }

    #[test]
    fn login_requires_both_fields() {
        let req = LoginRequest { username: Some("alice".into()), password: Some("".into()) };
        let errors = validate_login(&req).unwrap_err();
        assert_eq!(errors.get("password").unwrap(), [BLANK]);

        let req = LoginRequest { username: Some(" alice ".into()), password: Some("x".into()) };
        assert_eq!(validate_login(&req).unwrap(), ("alice".to_string(), "x".to_string()));
    }

    #[test]
    fn message_text_is_trimmed_and_bounded() {
        assert_eq!(validate_message_text(Some("  hi  ")).unwrap(), "hi");
        assert_eq!(validate_message_text(None).unwrap_err().get("text").unwrap(), [REQUIRED]);
        assert_eq!(validate_message_text(Some(" \n ")).unwrap_err().get("text").unwrap(), [BLANK]);

        assert!(validate_message_text(Some(&"x".repeat(MESSAGE_MAX_CHARS))).is_ok());
        assert!(validate_message_text(Some(&"x".repeat(MESSAGE_MAX_CHARS + 1))).is_err());
    }

    #[test]
    fn field_errors_serialize_as_map() {
        let errors = FieldErrors::single("username", "Username is already taken.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "username": ["Username is already taken."] }));
    }
}
