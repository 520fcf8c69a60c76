use bigdecimal::BigDecimal;
use std::fmt;

pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MAX_LEN: usize = 128;
pub const NAME_MAX_LEN: usize = 100;
pub const MOBILE_MAX_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control() || ch.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_username(username: &str) -> ValidationResult {
    validate_required("username", username)?;
    validate_max_len("username", username, USERNAME_MAX_LEN)?;

    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("username", "must not contain whitespace"));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult {
    validate_required("password", password)?;
    validate_max_len("password", password, PASSWORD_MAX_LEN)
}

pub fn validate_optional(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> ValidationResult {
    match value {
        Some(value) => validate_max_len(field, value, max_len),
        None => Ok(()),
    }
}

pub fn validate_positive_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

pub fn validate_non_negative_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount < &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must not be negative"));
    }

    Ok(())
}
