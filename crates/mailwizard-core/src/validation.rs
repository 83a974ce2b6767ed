//! Wizard input validation.

/// Validation error for a wizard input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Email address is empty.
    EmptyEmail,
    /// Email address format is invalid.
    InvalidEmail,
    /// Password is empty.
    EmptyPassword,
    /// Untrusted settings must be approved before use.
    ApprovalRequired,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "Email address is required",
            Self::InvalidEmail => "Invalid email address format",
            Self::EmptyPassword => "Password is required",
            Self::ApprovalRequired => "Please confirm the server settings before continuing",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::EmptyPassword => "password",
            Self::ApprovalRequired => "configuration_approved",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a single field.
pub type ValidationResult = Result<(), ValidationError>;

/// Field validation rules consumed by the onboarding state machine.
pub trait Validator: Send + Sync {
    /// Validate the email address.
    ///
    /// # Errors
    ///
    /// Returns the reason the address is unacceptable.
    fn validate_email_address(&self, email_address: &str) -> ValidationResult;

    /// Validate the password.
    ///
    /// # Errors
    ///
    /// Returns the reason the password is unacceptable.
    fn validate_password(&self, password: &str) -> ValidationResult;

    /// Validate that the configuration was approved, given whether discovered
    /// settings are trusted (`None` when nothing was discovered).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ApprovalRequired`] if approval is missing.
    fn validate_configuration_approval(
        &self,
        approved: bool,
        trusted: Option<bool>,
    ) -> ValidationResult;
}

/// Built-in validation rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl Validator for DefaultValidator {
    fn validate_email_address(&self, email_address: &str) -> ValidationResult {
        if email_address.trim().is_empty() {
            Err(ValidationError::EmptyEmail)
        } else if is_valid_email(email_address) {
            Ok(())
        } else {
            Err(ValidationError::InvalidEmail)
        }
    }

    fn validate_password(&self, password: &str) -> ValidationResult {
        if password.is_empty() {
            Err(ValidationError::EmptyPassword)
        } else {
            Ok(())
        }
    }

    fn validate_configuration_approval(
        &self,
        approved: bool,
        trusted: Option<bool>,
    ) -> ValidationResult {
        match trusted {
            Some(false) if !approved => Err(ValidationError::ApprovalRequired),
            _ => Ok(()),
        }
    }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return false;
    }

    // Domain must have at least two non-empty labels
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.com"));
        assert!(is_valid_email("  user@sub.example.com  "));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn test_email_errors() {
        let validator = DefaultValidator;
        assert_eq!(
            validator.validate_email_address("   "),
            Err(ValidationError::EmptyEmail)
        );
        assert_eq!(
            validator.validate_email_address("nope"),
            Err(ValidationError::InvalidEmail)
        );
        assert!(validator.validate_email_address("a@b.co").is_ok());
    }

    #[test]
    fn test_password() {
        let validator = DefaultValidator;
        assert_eq!(
            validator.validate_password(""),
            Err(ValidationError::EmptyPassword)
        );
        assert!(validator.validate_password(" ").is_ok());
    }

    #[test]
    fn test_approval_depends_on_trust() {
        let validator = DefaultValidator;
        assert!(validator.validate_configuration_approval(false, Some(true)).is_ok());
        assert!(validator.validate_configuration_approval(false, None).is_ok());
        assert!(validator.validate_configuration_approval(true, Some(false)).is_ok());
        assert_eq!(
            validator.validate_configuration_approval(false, Some(false)),
            Err(ValidationError::ApprovalRequired)
        );
    }

    #[test]
    fn test_error_fields() {
        assert_eq!(ValidationError::InvalidEmail.field(), "email");
        assert_eq!(ValidationError::EmptyPassword.field(), "password");
        assert_eq!(
            ValidationError::ApprovalRequired.to_string(),
            ValidationError::ApprovalRequired.message()
        );
    }

    proptest! {
        #[test]
        fn prop_well_formed_addresses_accepted(
            local in "[a-z0-9._+-]{1,16}",
            labels in proptest::collection::vec("[a-z0-9-]{1,12}", 2..4),
        ) {
            let address = format!("{local}@{}", labels.join("."));
            prop_assert!(is_valid_email(&address));
        }

        #[test]
        fn prop_addresses_without_at_rejected(s in "[^@]*") {
            prop_assert!(!is_valid_email(&s));
        }
    }
}
