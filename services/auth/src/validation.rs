//! Input validation utilities

use common::validation::{FieldError, FieldErrors};
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{LoginCredentials, RegisterRequest, UpdateUser};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.trim().is_empty() {
        return Err(FieldError::required("email"));
    }

    if email.len() > 254 {
        return Err(FieldError::new("email", "email must be at most 254 characters"));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(FieldError::new("email", "email must be a valid email address"));
    }

    Ok(())
}

/// Validate a new password: present and at least eight characters
pub fn validate_password(password: &str) -> Result<(), FieldError> {
    if password.is_empty() {
        return Err(FieldError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(FieldError::min_length("password", MIN_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), FieldError> {
    if name.trim().is_empty() {
        return Err(FieldError::required("name"));
    }

    Ok(())
}

fn collect(errors: &mut FieldErrors, result: Result<(), FieldError>) {
    if let Err(e) = result {
        errors.push(e);
    }
}

/// Validate a registration request, reporting every failing field
pub fn validate_register(request: &RegisterRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = FieldErrors::new();
    collect(&mut errors, validate_email(&request.email));
    collect(&mut errors, validate_password(&request.password));
    collect(&mut errors, validate_name(&request.name));
    errors.into_result()
}

/// Validate login credentials. Only presence and email shape are checked.
pub fn validate_login(credentials: &LoginCredentials) -> Result<(), Vec<FieldError>> {
    let mut errors = FieldErrors::new();
    collect(&mut errors, validate_email(&credentials.email));
    errors.require("password", &credentials.password);
    errors.into_result()
}

/// Validate a profile update
pub fn validate_update(update: &UpdateUser) -> Result<(), Vec<FieldError>> {
    let mut errors = FieldErrors::new();
    collect(&mut errors, validate_name(&update.name));
    if let Some(status) = &update.status {
        errors.require("status", status);
    }
    errors.into_result()
}
