//! Fluent assertions.
//!
//! `assert_that(&actual)` starts an assertion on any value. Plain equality goes
//! through `PartialEq`; `using_recursive_comparison()` switches to the
//! field-by-field engine and exposes every configuration option as a chained
//! method.
//!
//! ```rust,ignore
//! use fieldwise::assert_that;
//!
//! #[test]
//! fn person_matches_dto() -> eyre::Result<()> {
//!     assert_that(&person)
//!         .using_recursive_comparison()
//!         .ignoring_fields(["id"])
//!         .is_equal_to(&dto)?;
//!     Ok(())
//! }
//! ```
use std::{any::Any, cmp::Ordering, fmt};

use fieldwise_core::{
    assertion::{self, Error},
    calculator::RecursiveComparisonDifferenceCalculator,
    config,
    configuration::{Builder, RecursiveComparisonConfiguration},
    difference::Difference,
    introspection::{AsAny, Introspect, IntrospectionStrategy},
};
use tracing::*;

/// Starts an assertion on `actual`.
pub fn assert_that<T: ?Sized>(actual: &T) -> ObjectAssert<'_, T> {
    ObjectAssert {
        actual,
        description: String::new(),
    }
}

/// Assertion on a single value, created by [`assert_that`].
pub struct ObjectAssert<'a, T: ?Sized> {
    actual: &'a T,
    description: String,
}

impl<'a, T: ?Sized> ObjectAssert<'a, T> {
    /// Prefixes failure messages with `[description]`.
    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_equal_to<E>(&self, expected: &E) -> Result<(), Error>
    where
        T: PartialEq<E> + fmt::Debug,
        E: ?Sized + fmt::Debug,
    {
        if *self.actual == *expected {
            return Ok(());
        }
        Err(Error::Eq(format!(
            "{}check failed: `(actual == expected)`\n\n{}\n",
            prefix(&self.description),
            pretty_assertions::Comparison::new(self.actual, expected)
        )))
    }

    pub fn is_not_equal_to<E>(&self, expected: &E) -> Result<(), Error>
    where
        T: PartialEq<E> + fmt::Debug,
        E: ?Sized + fmt::Debug,
    {
        if *self.actual != *expected {
            return Ok(());
        }
        Err(Error::Ne(format!(
            "{}check failed: `(actual != expected)`\n\nBoth sides:\n{:#?}\n\n",
            prefix(&self.description),
            self.actual
        )))
    }
}

impl<'a, T: Introspect> ObjectAssert<'a, T> {
    /// Compares field by field, starting from the process-wide defaults.
    pub fn using_recursive_comparison(self) -> RecursiveComparisonAssert<'a> {
        let builder = Builder::from_defaults(&config::defaults().recursive_comparison);
        RecursiveComparisonAssert::new(self.actual, self.description, builder)
    }

    /// Compares field by field with an already built configuration. Further
    /// chained options are applied on top of it.
    pub fn using_recursive_comparison_with(
        self,
        configuration: &RecursiveComparisonConfiguration,
    ) -> RecursiveComparisonAssert<'a> {
        RecursiveComparisonAssert::new(self.actual, self.description, Builder::from(configuration))
    }
}

fn prefix(description: &str) -> String {
    if description.is_empty() {
        String::new()
    } else {
        format!("[{description}] ")
    }
}

/// Recursive comparison assertion, created by
/// [`ObjectAssert::using_recursive_comparison`].
///
/// The options mirror [`Builder`]; the configuration is built when one of the
/// terminal methods runs, so an invalid option (a malformed regex, an empty
/// field path) surfaces as [`Error::Comparison`] there.
pub struct RecursiveComparisonAssert<'a> {
    actual: &'a dyn Introspect,
    description: String,
    builder: Builder,
}

impl<'a> RecursiveComparisonAssert<'a> {
    fn new(actual: &'a dyn Introspect, description: String, builder: Builder) -> Self {
        RecursiveComparisonAssert {
            actual,
            description,
            builder,
        }
    }

    fn with(mut self, configure: impl FnOnce(Builder) -> Builder) -> Self {
        self.builder = configure(self.builder);
        self
    }

    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn ignoring_fields<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.ignoring_fields(paths))
    }

    pub fn ignoring_fields_matching_regexes<I, S>(self, regexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.ignoring_fields_matching_regexes(regexes))
    }

    pub fn ignoring_fields_of_type<T: Any>(self) -> Self {
        self.with(Builder::ignoring_fields_of_type::<T>)
    }

    pub fn ignoring_fields_of_types_matching_regexes<I, S>(self, regexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.ignoring_fields_of_types_matching_regexes(regexes))
    }

    pub fn ignoring_collection_order(self) -> Self {
        self.with(Builder::ignoring_collection_order)
    }

    pub fn ignoring_collection_order_in_fields<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.ignoring_collection_order_in_fields(paths))
    }

    pub fn ignoring_collection_order_in_fields_matching_regexes<I, S>(self, regexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.ignoring_collection_order_in_fields_matching_regexes(regexes))
    }

    pub fn ignoring_array_order(self) -> Self {
        self.with(Builder::ignoring_array_order)
    }

    pub fn comparing_only_fields<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.comparing_only_fields(paths))
    }

    pub fn comparing_only_fields_of_type<T: Any>(self) -> Self {
        self.with(Builder::comparing_only_fields_of_type::<T>)
    }

    pub fn with_comparator_for_fields<T, F, I, S>(self, comparator: F, paths: I) -> Self
    where
        T: Any,
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.with_comparator_for_fields(comparator, paths))
    }

    pub fn with_equals_for_fields<T, F, I, S>(self, predicate: F, paths: I) -> Self
    where
        T: Any,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.with_equals_for_fields(predicate, paths))
    }

    pub fn with_equals_for_fields_matching_regexes<T, F, I, S>(
        self,
        predicate: F,
        regexes: I,
    ) -> Self
    where
        T: Any,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.with_equals_for_fields_matching_regexes(predicate, regexes))
    }

    pub fn with_comparator_for_type<T, F>(self, comparator: F) -> Self
    where
        T: Any,
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.with(|builder| builder.with_comparator_for_type(comparator))
    }

    pub fn with_equals_for_type<T, F>(self, predicate: F) -> Self
    where
        T: Any,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.with(|builder| builder.with_equals_for_type(predicate))
    }

    pub fn with_error_message_for_fields<I, S>(self, message: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.with_error_message_for_fields(message, paths))
    }

    pub fn with_error_message_for_type<T: Any>(self, message: impl Into<String>) -> Self {
        self.with(|builder| builder.with_error_message_for_type::<T>(message))
    }

    pub fn with_strict_type_checking(self) -> Self {
        self.with(Builder::with_strict_type_checking)
    }

    pub fn with_strict_type_checking_on_actual_iterable(self) -> Self {
        self.with(Builder::with_strict_type_checking_on_actual_iterable)
    }

    pub fn allowing_array_type_for_expected(self) -> Self {
        self.with(Builder::allowing_array_type_for_expected)
    }

    pub fn ignoring_all_actual_none_fields(self) -> Self {
        self.with(Builder::ignoring_all_actual_none_fields)
    }

    pub fn ignoring_all_expected_none_fields(self) -> Self {
        self.with(Builder::ignoring_all_expected_none_fields)
    }

    pub fn allowing_enum_compared_to_string(self) -> Self {
        self.with(Builder::allowing_enum_compared_to_string)
    }

    pub fn treating_none_and_empty_collections_as_equal(self) -> Self {
        self.with(Builder::treating_none_and_empty_collections_as_equal)
    }

    pub fn using_partial_eq(self) -> Self {
        self.with(Builder::using_partial_eq)
    }

    pub fn ignoring_all_partial_eq(self) -> Self {
        self.with(Builder::ignoring_all_partial_eq)
    }

    pub fn ignoring_partial_eq_for_type<T: Any>(self) -> Self {
        self.with(Builder::ignoring_partial_eq_for_type::<T>)
    }

    pub fn ignoring_partial_eq_for_fields<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.ignoring_partial_eq_for_fields(paths))
    }

    pub fn ignoring_partial_eq_for_fields_matching_regexes<I, S>(self, regexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(|builder| builder.ignoring_partial_eq_for_fields_matching_regexes(regexes))
    }

    pub fn with_introspection_strategy(
        self,
        strategy: impl IntrospectionStrategy + 'static,
    ) -> Self {
        self.with(|builder| builder.with_introspection_strategy(strategy))
    }

    /// Builds the configuration the terminal methods will use.
    pub fn configuration(&self) -> Result<RecursiveComparisonConfiguration, Error> {
        Ok(self.builder.clone().build()?)
    }

    /// Fails with the full comparison report unless the values are recursively equal.
    pub fn is_equal_to<E: Introspect>(&self, expected: &E) -> Result<(), Error> {
        let configuration = self.configuration()?;
        trace!(
            "recursive comparison of {} against {}",
            self.actual.type_key(),
            expected.type_key()
        );
        assertion::check_recursively_eq(self.actual, expected, &configuration, &self.description)
    }

    /// Fails unless the values have at least one difference.
    pub fn is_not_equal_to<E: Introspect>(&self, expected: &E) -> Result<(), Error> {
        let configuration = self.configuration()?;
        assertion::check_recursively_ne(self.actual, expected, &configuration, &self.description)
    }

    /// Returns the differences without turning them into a failure.
    pub fn differences<E: Introspect>(&self, expected: &E) -> Result<Vec<Difference>, Error> {
        let configuration = self.configuration()?;
        let representation = config::defaults().representation.representation();
        Ok(RecursiveComparisonDifferenceCalculator::new(representation).determine_differences(
            self.actual,
            expected,
            &configuration,
        )?)
    }
}
