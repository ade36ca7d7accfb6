//! Shape checks that run before any handler sees a request body.
//!
//! Each request type comes in two forms: a loose `*Body` that accepts missing
//! fields, and the checked request the handlers work with. [`Validate`] turns
//! one into the other or returns every failed rule at once.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::dto::{
    ForgotPasswordBody, ForgotPasswordRequest, LoginBody, LoginRequest, RegisterBody,
    RegisterRequest, ResetPasswordBody, ResetPasswordRequest,
};

pub const MIN_PASSWORD_LEN: usize = 6;

/// One failed rule, reported in the `errors` array of a 400 response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub msg: &'static str,
    pub path: &'static str,
    pub location: &'static str,
}

impl FieldError {
    pub fn new(path: &'static str, msg: &'static str, value: Option<Value>) -> Self {
        Self {
            kind: "field",
            value,
            msg,
            path,
            location: "body",
        }
    }
}

pub trait Validate: Sized + Send {
    type Raw: DeserializeOwned + Default + Send;

    fn validate(raw: Self::Raw) -> Result<Self, Vec<FieldError>>;
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn email(raw: Option<String>, errors: &mut Vec<FieldError>) -> String {
    let normalized = raw.as_deref().unwrap_or_default().trim().to_lowercase();
    if !is_valid_email(&normalized) {
        errors.push(FieldError::new(
            "email",
            "Please include a valid email",
            Some(raw.map(Value::String).unwrap_or(Value::Null)),
        ));
    }
    normalized
}

// Secrets are never echoed back, hence no `value`.
fn min_len(
    raw: Option<String>,
    path: &'static str,
    msg: &'static str,
    errors: &mut Vec<FieldError>,
) -> String {
    let value = raw.unwrap_or_default();
    if value.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(path, msg, None));
    }
    value
}

fn present(
    raw: Option<String>,
    path: &'static str,
    msg: &'static str,
    errors: &mut Vec<FieldError>,
) -> String {
    match raw {
        Some(v) => v,
        None => {
            errors.push(FieldError::new(path, msg, None));
            String::new()
        }
    }
}

fn finish<T>(value: T, errors: Vec<FieldError>) -> Result<T, Vec<FieldError>> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

impl Validate for RegisterRequest {
    type Raw = RegisterBody;

    fn validate(raw: RegisterBody) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let username = raw.username.as_deref().unwrap_or_default().trim().to_string();
        if username.is_empty() {
            errors.push(FieldError::new(
                "username",
                "Username is required",
                Some(raw.username.map(Value::String).unwrap_or(Value::Null)),
            ));
        }
        let email = email(raw.email, &mut errors);
        let password = min_len(
            raw.password,
            "password",
            "Password must be at least 6 characters",
            &mut errors,
        );

        finish(RegisterRequest { username, email, password }, errors)
    }
}

impl Validate for LoginRequest {
    type Raw = LoginBody;

    fn validate(raw: LoginBody) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let email = email(raw.email, &mut errors);
        let password = present(raw.password, "password", "Password is required", &mut errors);
        finish(LoginRequest { email, password }, errors)
    }
}

impl Validate for ForgotPasswordRequest {
    type Raw = ForgotPasswordBody;

    fn validate(raw: ForgotPasswordBody) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let email = email(raw.email, &mut errors);
        finish(ForgotPasswordRequest { email }, errors)
    }
}

impl Validate for ResetPasswordRequest {
    type Raw = ResetPasswordBody;

    fn validate(raw: ResetPasswordBody) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let token = present(raw.token, "token", "Token is required", &mut errors);
        let new_password = min_len(
            raw.new_password,
            "newPassword",
            "New password must be at least 6 characters",
            &mut errors,
        );
        finish(ResetPasswordRequest { token, new_password }, errors)
    }
}
