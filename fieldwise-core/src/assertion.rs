//! Recursive comparison assertion macros.
//!
//! `check_recursively_eq!` and `check_recursively_ne!` return
//! `Result<_, Error>` instead of panicking, so test functions returning
//! `eyre::Result` can propagate failures with `?` and get `eyre`'s report.

use std::fmt;

use crate::{
    calculator::RecursiveComparisonDifferenceCalculator,
    config,
    configuration::RecursiveComparisonConfiguration,
    introspection::Introspect,
    report::{ComparisonReport, Representation},
};

/// Error returned by failed assertions, designed to be propagated from test
/// functions with `?`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Eq(String),
    #[error("{0}")]
    Ne(String),
    /// Values expected to be recursively equal are not. Holds the full report.
    #[error("{0}")]
    RecursivelyEq(String),
    /// Values expected to differ are recursively equal.
    #[error("{0}")]
    RecursivelyNe(String),
    /// The comparison itself could not run.
    #[error(transparent)]
    Comparison(#[from] crate::Error),
}

struct Described<'a>(&'a str);

impl fmt::Display for Described<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            Ok(())
        } else {
            write!(f, "[{}] ", self.0)
        }
    }
}

/// Fails with the full comparison report unless `actual` and `expected` are
/// recursively equal. A non-empty `description` prefixes the report.
pub fn check_recursively_eq(
    actual: &dyn Introspect,
    expected: &dyn Introspect,
    configuration: &RecursiveComparisonConfiguration,
    description: &str,
) -> Result<(), Error> {
    let defaults = config::defaults();
    let representation = defaults.representation.representation();
    let differences = RecursiveComparisonDifferenceCalculator::new(representation)
        .determine_differences(actual, expected, configuration)?;
    if differences.is_empty() {
        return Ok(());
    }

    let mut report = ComparisonReport::new(
        representation.to_display_string(actual),
        representation.to_display_string(expected),
        &differences,
    );
    if defaults.recursive_comparison.report_configuration {
        report = report.with_configuration(configuration);
    }
    Err(Error::RecursivelyEq(format!(
        "{}{report}",
        Described(description)
    )))
}

/// Fails unless `actual` and `expected` have at least one difference.
pub fn check_recursively_ne(
    actual: &dyn Introspect,
    expected: &dyn Introspect,
    configuration: &RecursiveComparisonConfiguration,
    description: &str,
) -> Result<(), Error> {
    let defaults = config::defaults();
    let representation = defaults.representation.representation();
    let differences = RecursiveComparisonDifferenceCalculator::new(representation)
        .determine_differences(actual, expected, configuration)?;
    if !differences.is_empty() {
        return Ok(());
    }

    let mut report = ComparisonReport::new(
        representation.to_display_string(actual),
        representation.to_display_string(expected),
        &differences,
    );
    if defaults.recursive_comparison.report_configuration {
        report = report.with_configuration(configuration);
    }
    Err(Error::RecursivelyNe(format!(
        "{}{report}",
        Described(description)
    )))
}

/// Asserts that two values are equal when compared field by field, recursively.
///
/// Both values must implement [`Introspect`](crate::Introspect); they do not need
/// to be of the same type. Without `using = ...` the process-wide defaults are
/// applied. On failure the error holds the full difference report.
///
/// The operands are borrowed by the macro, so pass values (or dereferenced
/// references) rather than references.
///
/// # Examples
///
/// ```rust,ignore
/// use fieldwise::{check_recursively_eq, RecursiveComparisonConfiguration};
///
/// fn same_person(person: &Person, dto: &PersonDto) -> eyre::Result<()> {
///     check_recursively_eq!(*person, *dto);
///
///     let configuration = RecursiveComparisonConfiguration::builder()
///         .ignoring_fields(["id"])
///         .build()?;
///     check_recursively_eq!(*person, *dto, using = configuration, "ids are generated");
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! check_recursively_eq {
    ($left:expr, $right:expr$(,)?) => ({
        $crate::check_recursively_eq!(@ check_recursively_eq, $left, $right, $crate::__default_configuration!(), "");
    });
    ($left:expr, $right:expr, using = $configuration:expr$(,)?) => ({
        $crate::check_recursively_eq!(@ check_recursively_eq, $left, $right, $configuration, "");
    });
    ($left:expr, $right:expr, using = $configuration:expr, $($arg:tt)+) => ({
        $crate::check_recursively_eq!(@ check_recursively_eq, $left, $right, $configuration, &format!($($arg)+));
    });
    ($left:expr, $right:expr, $($arg:tt)+) => ({
        $crate::check_recursively_eq!(@ check_recursively_eq, $left, $right, $crate::__default_configuration!(), &format!($($arg)+));
    });
    (@ $check:ident, $left:expr, $right:expr, $configuration:expr, $description:expr) => ({
        match (&($left), &($right), &($configuration)) {
            (left_val, right_val, configuration) => {
                $crate::assertion::$check(left_val, right_val, configuration, $description)?;
            }
        }
    });
}

/// Asserts that two values differ in at least one field when compared recursively.
/// Accepts the same forms as [`check_recursively_eq!`].
#[macro_export]
macro_rules! check_recursively_ne {
    ($left:expr, $right:expr$(,)?) => ({
        $crate::check_recursively_eq!(@ check_recursively_ne, $left, $right, $crate::__default_configuration!(), "");
    });
    ($left:expr, $right:expr, using = $configuration:expr$(,)?) => ({
        $crate::check_recursively_eq!(@ check_recursively_ne, $left, $right, $configuration, "");
    });
    ($left:expr, $right:expr, using = $configuration:expr, $($arg:tt)+) => ({
        $crate::check_recursively_eq!(@ check_recursively_ne, $left, $right, $configuration, &format!($($arg)+));
    });
    ($left:expr, $right:expr, $($arg:tt)+) => ({
        $crate::check_recursively_eq!(@ check_recursively_ne, $left, $right, $crate::__default_configuration!(), &format!($($arg)+));
    });
}

#[doc(hidden)]
#[macro_export]
macro_rules! __default_configuration {
    () => {
        $crate::configuration::RecursiveComparisonConfiguration::from_defaults(
            &$crate::config::defaults().recursive_comparison,
        )
    };
}
