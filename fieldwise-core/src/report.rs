//! Rendering of values and of recursive comparison failures.

use std::fmt;

use crate::{
    configuration::RecursiveComparisonConfiguration, difference::Difference,
    introspection::Introspect,
};

/// Turns values into the strings shown in difference reports.
pub trait Representation: Send + Sync {
    fn to_display_string(&self, value: &dyn Introspect) -> String;
}

/// `Debug` rendering truncated to `max_length` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardRepresentation {
    pub max_length: usize,
}

impl StandardRepresentation {
    pub const DEFAULT_MAX_LENGTH: usize = 1000;

    pub fn new(max_length: usize) -> StandardRepresentation {
        StandardRepresentation { max_length }
    }
}

impl Default for StandardRepresentation {
    fn default() -> Self {
        StandardRepresentation::new(Self::DEFAULT_MAX_LENGTH)
    }
}

impl Representation for StandardRepresentation {
    fn to_display_string(&self, value: &dyn Introspect) -> String {
        let rendered = format!("{value:?}");
        match rendered.char_indices().nth(self.max_length) {
            Some((end, _)) => format!("{}...", &rendered[..end]),
            None => rendered,
        }
    }
}

/// The failure message of a recursive comparison assertion.
pub struct ComparisonReport<'a> {
    actual: String,
    expected: String,
    differences: &'a [Difference],
    configuration: Option<&'a RecursiveComparisonConfiguration>,
}

impl<'a> ComparisonReport<'a> {
    /// Report for values expected to be recursively equal. An empty `differences`
    /// renders the report for values expected to differ.
    pub fn new(actual: String, expected: String, differences: &'a [Difference]) -> Self {
        ComparisonReport {
            actual,
            expected,
            differences,
            configuration: None,
        }
    }

    /// Appends the description of `configuration` to the report.
    pub fn with_configuration(mut self, configuration: &'a RecursiveComparisonConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }
}

impl fmt::Display for ComparisonReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expecting actual:\n  {}\n", self.actual)?;
        if self.differences.is_empty() {
            write!(
                f,
                "not to be equal to:\n  {}\nwhen recursively comparing field by field",
                self.expected
            )?;
        } else {
            let noun = if self.differences.len() == 1 {
                "difference"
            } else {
                "differences"
            };
            write!(
                f,
                "to be equal to:\n  {}\nwhen recursively comparing field by field, but found the following {} {noun}:\n",
                self.expected,
                self.differences.len()
            )?;
            for difference in self.differences {
                write!(f, "\n{difference}\n")?;
            }
        }
        if let Some(configuration) = self.configuration {
            write!(
                f,
                "\nThe recursive comparison was performed with this configuration:\n{}",
                configuration.multi_line_description()
            )?;
        }
        Ok(())
    }
}
