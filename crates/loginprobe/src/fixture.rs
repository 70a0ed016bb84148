//! Fixture registry: named test inputs.
//!
//! Valid credentials come from the environment and are never hard-coded.
//! Negative-case inputs are literals because they are deliberately invalid.

use crate::result::{ProbeError, ProbeResult};
use serde::Serialize;
use std::fmt;

/// Environment variable holding the registered email address
pub const EMAIL_ENV: &str = "EMAIL_ADDRESS";

/// Environment variable holding the registered account's password
pub const PASSWORD_ENV: &str = "PASSWORD";

/// Syntactically invalid email
pub const INVALID_EMAIL: &str = "unregistered_email_address";

/// Well-formed email with no account behind it
pub const UNREGISTERED_EMAIL: &str = "valid_unregistered_email_address@gmail.com";

/// Well-formed email used to reach the password step
pub const GENERIC_EMAIL: &str = "valid_email_address@gmail.com";

/// Password that never matches
pub const INVALID_PASSWORD: &str = "invalid_password";

/// Logical fixture names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FixtureName {
    /// Registered account email (environment)
    ValidEmail,
    /// Registered account password (environment)
    ValidPassword,
    /// Malformed email literal
    InvalidEmail,
    /// Well-formed, unregistered email literal
    UnregisteredEmail,
    /// Well-formed email literal used for step navigation
    GenericEmail,
    /// Wrong password literal
    InvalidPassword,
}

impl FixtureName {
    /// Every fixture name
    pub const ALL: [Self; 6] = [
        Self::ValidEmail,
        Self::ValidPassword,
        Self::InvalidEmail,
        Self::UnregisteredEmail,
        Self::GenericEmail,
        Self::InvalidPassword,
    ];

    /// Environment variable backing this fixture, if any
    #[must_use]
    pub const fn env_var(self) -> Option<&'static str> {
        match self {
            Self::ValidEmail => Some(EMAIL_ENV),
            Self::ValidPassword => Some(PASSWORD_ENV),
            _ => None,
        }
    }

    /// Whether the value must be hidden in output
    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::ValidPassword)
    }
}

impl fmt::Display for FixtureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ValidEmail => "credentials.validEmail",
            Self::ValidPassword => "credentials.validPassword",
            Self::InvalidEmail => "invalidInputs.invalidEmail",
            Self::UnregisteredEmail => "invalidInputs.validUnregisteredEmail",
            Self::GenericEmail => "invalidInputs.genericEmail",
            Self::InvalidPassword => "invalidInputs.invalidPassword",
        })
    }
}

/// A string that never appears in `Debug` output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the value for typing into a field
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Credentials supplied by the execution environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Registered email
    pub email: String,
    /// Registered password
    pub password: Secret,
}

/// Immutable registry of test inputs for one run
#[derive(Debug, Clone, Default)]
pub struct FixtureRegistry {
    email: Option<String>,
    password: Option<Secret>,
}

impl FixtureRegistry {
    /// Read credentials from `EMAIL_ADDRESS` and `PASSWORD`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; empty values count as unset
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            email: read(EMAIL_ENV),
            password: read(PASSWORD_ENV).map(Secret::new),
        }
    }

    /// Registry with explicit credentials
    #[must_use]
    pub fn with_credentials(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(Secret::new(password)),
        }
    }

    /// Whether both credential fixtures are present
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.email.is_some() && self.password.is_some()
    }

    /// Both credentials, or the first missing one as an error
    pub fn credentials(&self) -> ProbeResult<Credentials> {
        Ok(Credentials {
            email: self.get(FixtureName::ValidEmail)?.to_string(),
            password: Secret::new(self.get(FixtureName::ValidPassword)?),
        })
    }

    /// Value of a fixture
    pub fn get(&self, name: FixtureName) -> ProbeResult<&str> {
        let value = match name {
            FixtureName::ValidEmail => self.email.as_deref(),
            FixtureName::ValidPassword => self.password.as_ref().map(Secret::expose),
            FixtureName::InvalidEmail => Some(INVALID_EMAIL),
            FixtureName::UnregisteredEmail => Some(UNREGISTERED_EMAIL),
            FixtureName::GenericEmail => Some(GENERIC_EMAIL),
            FixtureName::InvalidPassword => Some(INVALID_PASSWORD),
        };
        value.ok_or_else(|| ProbeError::MissingFixture {
            name: name.to_string(),
            variable: name.env_var().unwrap_or_default().to_string(),
        })
    }

    /// Printable value: secrets masked, missing values marked
    #[must_use]
    pub fn display_value(&self, name: FixtureName) -> String {
        match self.get(name) {
            Ok(_) if name.is_secret() => "***".to_string(),
            Ok(value) => value.to_string(),
            Err(_) => format!("<unset: {}>", name.env_var().unwrap_or_default()),
        }
    }
}
