//! Form validation for the sign-in and sign-up commands

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\S+@\S+\.\S+").unwrap_or_else(|e| panic!("invalid email pattern: {}", e))
});

const MIN_PASSWORD_LEN: usize = 6;

/// Field-level problems found in a form
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub fields: Vec<(&'static str, &'static str)>,
}

impl FormErrors {
    fn push(&mut self, field: &'static str, message: &'static str) {
        self.fields.push((field, message));
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.fields.iter().map(|(_, msg)| *msg).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

fn check_email(errors: &mut FormErrors, email: &str) {
    if email.is_empty() {
        errors.push("email", "Email is required");
    } else if !EMAIL_RE.is_match(email) {
        errors.push("email", "Email is invalid");
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    check_email(&mut errors, email);
    if password.is_empty() {
        errors.push("password", "Password is required");
    }
    errors.into_result()
}

pub struct SignupForm<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

pub fn validate_signup(form: &SignupForm<'_>) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();

    if form.first_name.trim().is_empty() {
        errors.push("firstName", "First name is required");
    }
    if form.last_name.trim().is_empty() {
        errors.push("lastName", "Last name is required");
    }
    check_email(&mut errors, form.email);

    if form.password.is_empty() {
        errors.push("password", "Password is required");
    } else if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("password", "Password must be at least 6 characters");
    }

    if form.confirm_password.is_empty() {
        errors.push("confirmPassword", "Please confirm your password");
    } else if form.confirm_password != form.password {
        errors.push("confirmPassword", "Passwords do not match");
    }

    errors.into_result()
}
