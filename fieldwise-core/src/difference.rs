use std::fmt;

use crate::location::FieldLocation;

/// Why two values were considered different.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DifferenceKind {
    ValueMismatch,
    NullMismatch,
    TypeMismatch,
    StrictTypeMismatch,
    SizeMismatch,
    MissingFields,
    UnmatchedElements,
    KeyMismatch,
    MissingKeys,
}

/// One field-level mismatch found by the recursive comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    location: FieldLocation,
    actual: String,
    expected: String,
    description: Option<String>,
    custom_message: Option<String>,
    kind: DifferenceKind,
    keys: Option<(String, String)>,
}

impl Difference {
    pub fn new(
        location: FieldLocation,
        actual: impl Into<String>,
        expected: impl Into<String>,
        kind: DifferenceKind,
    ) -> Difference {
        Difference {
            location,
            actual: actual.into(),
            expected: expected.into(),
            description: None,
            custom_message: None,
            kind,
            keys: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Difference {
        self.description = Some(description.into());
        self
    }

    pub fn with_custom_message(mut self, message: Option<String>) -> Difference {
        self.custom_message = message;
        self
    }

    /// Attaches the keys of a sorted map entry whose keys differ.
    pub fn with_keys(mut self, actual: impl Into<String>, expected: impl Into<String>) -> Difference {
        self.keys = Some((actual.into(), expected.into()));
        self
    }

    pub fn location(&self) -> &FieldLocation {
        &self.location
    }

    pub fn actual(&self) -> &str {
        &self.actual
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn custom_message(&self) -> Option<&str> {
        self.custom_message.as_deref()
    }

    pub fn kind(&self) -> DifferenceKind {
        self.kind
    }

    /// `(actual key, expected key)` for sorted map key differences.
    pub fn keys(&self) -> Option<(&str, &str)> {
        self.keys
            .as_ref()
            .map(|(actual, expected)| (actual.as_str(), expected.as_str()))
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.custom_message {
            return f.write_str(message);
        }

        if self.location.depth() == 0 {
            writeln!(f, "Top level actual and expected objects differ:")?;
        } else {
            writeln!(
                f,
                "field/property '{}' differ:",
                self.location.path_for_report()
            )?;
        }
        write!(
            f,
            "- actual value  : {}\n- expected value: {}",
            self.actual, self.expected
        )?;
        if let Some((actual, expected)) = &self.keys {
            write!(
                f,
                "\nmap key difference:\n- actual key  : {actual}\n- expected key: {expected}"
            )?;
        }
        if let Some(description) = &self.description {
            write!(f, "\n{description}")?;
        }
        Ok(())
    }
}
