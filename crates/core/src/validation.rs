//! Form checks that run before any network call.
//!
//! The messages are shown to customers verbatim, so they are Lithuanian.

/// Minimum password length accepted on sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A form input rejected before reaching the identity provider.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Prašome užpildyti visus laukus")]
    EmptyFields,
    #[error("Slaptažodis turi būti bent 6 simbolių ilgio")]
    PasswordTooShort,
    #[error("Slaptažodžiai nesutampa")]
    PasswordMismatch,
    #[error("Jūsų krepšelis tuščias")]
    EmptyCart,
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Sign-in needs an email and a password.
///
/// # Errors
///
/// [`ValidationError::EmptyFields`] if either is blank.
pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ValidationError> {
    if blank(email) || password.is_empty() {
        return Err(ValidationError::EmptyFields);
    }
    Ok(())
}

/// Sign-up additionally needs a long enough password, typed twice.
///
/// Checks run in order: empty fields, length, confirmation.
///
/// # Errors
///
/// The first failing check.
pub fn validate_sign_up(email: &str, password: &str, confirm: &str) -> Result<(), ValidationError> {
    validate_sign_in(email, password)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Password reset only needs the email.
///
/// # Errors
///
/// [`ValidationError::EmptyFields`] if it is blank.
pub fn validate_reset(email: &str) -> Result<(), ValidationError> {
    if blank(email) {
        return Err(ValidationError::EmptyFields);
    }
    Ok(())
}

/// A display name must have some visible text.
///
/// # Errors
///
/// [`ValidationError::EmptyFields`] if it is blank.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if blank(name) {
        return Err(ValidationError::EmptyFields);
    }
    Ok(())
}
