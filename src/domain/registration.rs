use std::{fmt, sync::LazyLock};

use non_empty_string::NonEmptyString;
use regex::Regex;

use crate::domain::VehicleCategory;

/// Letters, digits, optional trailing letters: `AB123`, `X1`, `XY1234ZZ`.
static PLATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{1,2}[0-9]{1,4}[A-Za-z]{0,2}$").expect("pattern is valid")
});

/// A validated registration number.
///
/// Registrations are the identity of a parked vehicle. They compare
/// case-insensitively: `abc123` and `ABC123` are the same vehicle.
#[derive(Debug, Clone)]
pub struct Registration(NonEmptyString);

impl Registration {
    /// Validates `candidate` against the rule for `category`.
    ///
    /// - Car and Motorcycle: 1–2 letters, 1–4 digits, 0–2 letters; at most 10
    ///   characters.
    /// - Bus: any non-blank string of at most 12 characters.
    /// - Bicycle: any non-blank string of at most 8 characters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRegistration`] describing the first rule the
    /// candidate breaks.
    pub fn parse(category: VehicleCategory, candidate: &str) -> Result<Self, InvalidRegistration> {
        let reject = |reason| InvalidRegistration {
            category,
            candidate: candidate.to_string(),
            reason,
        };

        if candidate.trim().is_empty() {
            return Err(reject(Reason::Blank));
        }

        let max = category.max_registration_len();
        if candidate.chars().count() > max {
            return Err(reject(Reason::TooLong(max)));
        }

        let strict = matches!(category, VehicleCategory::Car | VehicleCategory::Motorcycle);
        if strict && !PLATE_PATTERN.is_match(candidate) {
            return Err(reject(Reason::Format));
        }

        NonEmptyString::new(candidate.to_string())
            .map(Self)
            .map_err(|_| reject(Reason::Blank))
    }

    /// Whether `candidate` is an acceptable registration for `category`.
    #[must_use]
    pub fn is_valid(category: VehicleCategory, candidate: &str) -> bool {
        Self::parse(category, candidate).is_ok()
    }

    /// A short description of the rule for `category`, for prompts and
    /// error messages.
    #[must_use]
    pub const fn rule(category: VehicleCategory) -> &'static str {
        match category {
            VehicleCategory::Car | VehicleCategory::Motorcycle => {
                "1-2 letters, 1-4 digits, 0-2 letters (max 10 characters)"
            }
            VehicleCategory::Bus => "any text up to 12 characters",
            VehicleCategory::Bicycle => "any text up to 8 characters",
        }
    }

    /// Returns the registration as entered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Case-insensitive comparison against a raw string.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.as_str()
            .chars()
            .flat_map(char::to_lowercase)
            .eq(other.chars().flat_map(char::to_lowercase))
    }

    /// A case-folded key, for use in sets and maps.
    #[must_use]
    pub fn key(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl PartialEq for Registration {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.as_str())
    }
}

impl Eq for Registration {}

impl PartialEq<str> for Registration {
    fn eq(&self, other: &str) -> bool {
        self.matches(other)
    }
}

impl PartialEq<&str> for Registration {
    fn eq(&self, other: &&str) -> bool {
        self.matches(other)
    }
}

impl AsRef<str> for Registration {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a registration breaks its category's rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {category} registration '{candidate}': {reason}")]
pub struct InvalidRegistration {
    category: VehicleCategory,
    candidate: String,
    reason: Reason,
}

impl InvalidRegistration {
    /// The category whose rule was applied.
    #[must_use]
    pub const fn category(&self) -> VehicleCategory {
        self.category
    }

    /// The rejected input.
    #[must_use]
    pub fn candidate(&self) -> &str {
        &self.candidate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reason {
    Blank,
    TooLong(usize),
    Format,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => f.write_str("must not be blank"),
            Self::TooLong(max) => write!(f, "must be at most {max} characters"),
            Self::Format => f.write_str("expected 1-2 letters, 1-4 digits, 0-2 letters"),
        }
    }
}
