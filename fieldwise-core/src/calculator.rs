//! # Difference Calculator
//!
//! Walks two object graphs side by side and collects every field-level
//! difference. Recursion is replaced by an explicit work stack, so very deep
//! acyclic graphs cannot overflow the call stack.
//!
//! ## Per node flow (block diagram)
//!
//! ```text
//! +----------------+    +----------------+    +-------------------+    +----------------+
//! | pop DualValue  | -> | resolve Ref    | -> | same identity?    | -> | comparator?    |
//! | from the stack |    | chains         |    | -> equal          |    | -> verdict     |
//! +----------------+    +----------------+    +-------------------+    +----------------+
//!                                                                              |
//!          +-------------------------------------------------------------------+
//!          v
//! +----------------+    +----------------+    +-------------------+    +----------------+
//! | null on one    | -> | strict type    | -> | pair already      | -> | dispatch on    |
//! | side?          |    | check          |    | active? (cycle)   |    | expected shape |
//! +----------------+    +----------------+    +-------------------+    +----------------+
//!                                                                              |
//!                         children are pushed back on the stack <--------------+
//! ```
//!
//! Ignored fields are filtered before they are pushed, so no other rule ever
//! applies to them.

use itertools::Itertools;
use std::sync::Arc;
use tracing::*;

use crate::{
    configuration::{RecursiveComparisonConfiguration, StrictTypeChecking},
    difference::{Difference, DifferenceKind},
    introspection::{resolve, Field, Introspect, IntrospectionError, Node, Scalar, Variant},
    location::FieldLocation,
    report::{Representation, StandardRepresentation},
    state::{ComparisonState, DualValue, Identity, Task, VisitedPairs},
    Result,
};

/// Computes the differences between two values under a [`RecursiveComparisonConfiguration`].
#[derive(Clone)]
pub struct RecursiveComparisonDifferenceCalculator {
    representation: Arc<dyn Representation>,
}

impl Default for RecursiveComparisonDifferenceCalculator {
    fn default() -> Self {
        RecursiveComparisonDifferenceCalculator::new(StandardRepresentation::default())
    }
}

impl RecursiveComparisonDifferenceCalculator {
    pub fn new(representation: impl Representation + 'static) -> Self {
        RecursiveComparisonDifferenceCalculator {
            representation: Arc::new(representation),
        }
    }

    pub fn representation(&self) -> &dyn Representation {
        self.representation.as_ref()
    }

    /// Returns every difference between `actual` and `expected`, sorted by location.
    ///
    /// Mismatches are never errors. An error is returned only when a value cannot be
    /// introspected, e.g. a compared-only field does not exist on `actual`.
    pub fn determine_differences(
        &self,
        actual: &dyn Introspect,
        expected: &dyn Introspect,
        configuration: &RecursiveComparisonConfiguration,
    ) -> Result<Vec<Difference>> {
        debug!(
            "recursive comparison of {} against {} started",
            actual.type_key(),
            expected.type_key()
        );
        check_compared_fields(actual, configuration)?;

        let comparison = Comparison {
            configuration,
            representation: self.representation.as_ref(),
        };
        let mut visited = VisitedPairs::default();
        let mut differences = {
            let mut state = ComparisonState::new(&mut visited);
            state.push(DualValue::new(FieldLocation::root(), actual, expected));
            comparison.drain(&mut state)?;
            state.take_differences()
        };
        differences.sort_by(|a, b| a.location().cmp(b.location()));

        debug!(
            "recursive comparison finished with {} difference(s)",
            differences.len()
        );
        Ok(differences)
    }
}

/// Shorthand for [`RecursiveComparisonDifferenceCalculator::determine_differences`]
/// with the standard representation.
pub fn determine_differences(
    actual: &dyn Introspect,
    expected: &dyn Introspect,
    configuration: &RecursiveComparisonConfiguration,
) -> Result<Vec<Difference>> {
    RecursiveComparisonDifferenceCalculator::default().determine_differences(
        actual,
        expected,
        configuration,
    )
}

/// Every compared-only field must exist on the root actual value, as far as it can be
/// followed through structs and enum variants.
fn check_compared_fields(
    actual: &dyn Introspect,
    configuration: &RecursiveComparisonConfiguration,
) -> Result<()> {
    let strategy = configuration.introspection_strategy();
    for path in configuration.compared_fields() {
        let mut current = actual;
        for segment in path.split('.') {
            let (value, node) = resolve(current);
            let fields = match node {
                Node::Struct(fields) => fields,
                Node::Variant(variant) => variant.fields,
                _ => break,
            };
            let children = strategy.children(value.type_key(), &fields)?;
            match children.into_iter().find(|child| child.name == segment) {
                Some(child) => current = child.value,
                None => {
                    return Err(IntrospectionError::UnknownField {
                        owner: value.type_key().to_string(),
                        field: path.to_string(),
                    }
                    .into())
                }
            }
        }
    }
    Ok(())
}

/// Strips module paths from a type name: `alloc::vec::Vec<app::Person>` becomes `Vec<Person>`.
pub(crate) fn simple_type_name(name: &str) -> String {
    let mut simple = String::with_capacity(name.len());
    let mut word = String::new();
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            word.clear();
        } else if c.is_alphanumeric() || c == '_' {
            word.push(c);
        } else {
            simple.push_str(&word);
            word.clear();
            simple.push(c);
        }
    }
    simple.push_str(&word);
    simple
}

fn is_none_or_empty(node: &Node<'_>) -> bool {
    match node {
        Node::Null => true,
        Node::Sequence(sequence) => sequence.elements.is_empty(),
        _ => false,
    }
}

pub(crate) fn shape_error(expected_shape: &str, actual: &dyn Introspect) -> String {
    format!(
        "expected field is {expected_shape} but actual field is not ({})",
        simple_type_name(actual.type_key().name())
    )
}

/// The values compared at one location, wrappers resolved.
pub(crate) struct Pair<'a> {
    pub(crate) location: FieldLocation,
    pub(crate) actual: &'a dyn Introspect,
    pub(crate) expected: &'a dyn Introspect,
    actual_shown: &'a dyn Introspect,
    expected_shown: &'a dyn Introspect,
}

pub(crate) struct Comparison<'c> {
    pub(crate) configuration: &'c RecursiveComparisonConfiguration,
    representation: &'c dyn Representation,
}

impl Comparison<'_> {
    /// Processes the work stack until it is empty. A trial run stops at its first mismatch.
    pub(crate) fn drain<'a>(&self, state: &mut ComparisonState<'_, 'a>) -> Result<()> {
        while let Some(task) = state.pop() {
            match task {
                Task::Leave(pair) => state.leave(&pair),
                Task::Compare(dual) => {
                    self.compare(dual, state)?;
                    if state.is_trial() && state.has_mismatch() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn render(&self, value: &dyn Introspect) -> String {
        self.representation.to_display_string(value)
    }

    pub(crate) fn difference(&self, pair: &Pair<'_>, kind: DifferenceKind) -> Difference {
        let message = if self.configuration.has_custom_messages() {
            let types = [pair.expected.type_key(), pair.actual.type_key()];
            self.configuration
                .error_message_for(&pair.location, &types)
                .map(str::to_string)
        } else {
            None
        };
        Difference::new(
            pair.location.clone(),
            self.render(pair.actual_shown),
            self.render(pair.expected_shown),
            kind,
        )
        .with_custom_message(message)
    }

    fn compare<'a>(&self, dual: DualValue<'a>, state: &mut ComparisonState<'_, 'a>) -> Result<()> {
        let DualValue {
            location,
            actual,
            expected,
            within_compared_type,
        } = dual;
        trace!("comparing {}", location.path_for_report());

        let (actual_value, actual_node) = resolve(actual);
        let (expected_value, expected_node) = resolve(expected);
        if Identity::of(actual_value) == Identity::of(expected_value) {
            return Ok(());
        }

        let configuration = self.configuration;
        if configuration.has_compared_types() {
            let within = within_compared_type
                || [
                    actual_value.type_key(),
                    actual.declared_type(),
                    expected_value.type_key(),
                    expected.declared_type(),
                ]
                .into_iter()
                .any(|key| configuration.is_compared_type(key));
            state.focus(within, within || configuration.is_within_compared_field(&location));
        }

        let pair = Pair {
            location,
            actual: actual_value,
            expected: expected_value,
            actual_shown: if actual_node.is_null() { actual } else { actual_value },
            expected_shown: if expected_node.is_null() {
                expected
            } else {
                expected_value
            },
        };

        let either_null = actual_node.is_null() || expected_node.is_null();
        if let Some(equal) = self.custom_comparison(&pair, actual, expected, either_null) {
            if !equal {
                state.record(|| self.difference(&pair, DifferenceKind::ValueMismatch));
            }
            return Ok(());
        }

        if configuration.treats_none_and_empty_collections_as_equal()
            && is_none_or_empty(&actual_node)
            && is_none_or_empty(&expected_node)
        {
            return Ok(());
        }

        match (actual_node.is_null(), expected_node.is_null()) {
            (true, true) => return Ok(()),
            (true, false) | (false, true) => {
                state.record(|| self.difference(&pair, DifferenceKind::NullMismatch));
                return Ok(());
            }
            (false, false) => {}
        }

        if configuration.uses_partial_eq_for(&pair.location, pair.actual.type_key()) {
            if let Some(equal) = pair.actual.partial_eq(pair.expected) {
                if !equal {
                    state.record(|| {
                        self.difference(&pair, DifferenceKind::ValueMismatch)
                            .with_description("Actual was compared to expected with PartialEq as the recursive comparison was configured to do so.")
                    });
                }
                return Ok(());
            }
        }

        if self.violates_strict_types(&pair, &actual_node) {
            state.record(|| {
                self.difference(&pair, DifferenceKind::StrictTypeMismatch)
                    .with_description(format!(
                        "the compared values are considered different since the recursive comparison enforces strict type checking and the actual value type {} is not equal to the expected value type {}",
                        pair.actual.type_key(),
                        pair.expected.type_key()
                    ))
            });
            return Ok(());
        }

        if matches!(
            expected_node,
            Node::Struct(_) | Node::Variant(_) | Node::Sequence(_) | Node::Map(_)
        ) && !state.enter((Identity::of(pair.actual), Identity::of(pair.expected)))
        {
            trace!("cycle closed at {}", pair.location.path_for_report());
            return Ok(());
        }

        match expected_node {
            Node::Scalar(scalar) => self.compare_scalar(&pair, &actual_node, scalar, state),
            Node::Variant(variant) => self.compare_variant(&pair, actual_node, variant, state),
            Node::Struct(fields) => match actual_node {
                Node::Struct(actual_fields) => {
                    self.compare_fields(&pair, &actual_fields, &fields, state)
                }
                _ => {
                    state.record(|| {
                        self.difference(&pair, DifferenceKind::TypeMismatch)
                            .with_description(shape_error("a struct", pair.actual))
                    });
                    Ok(())
                }
            },
            Node::Sequence(sequence) => self.compare_sequence(&pair, actual_node, sequence, state),
            Node::Map(map) => self.compare_map(&pair, actual_node, map, state),
            Node::Null | Node::Ref(_) => Ok(()),
        }
    }

    /// Verdict of the comparator registered for this location or these types, if any.
    fn custom_comparison(
        &self,
        pair: &Pair<'_>,
        actual: &dyn Introspect,
        expected: &dyn Introspect,
        either_null: bool,
    ) -> Option<bool> {
        let types = [
            pair.actual.type_key(),
            actual.type_key(),
            pair.expected.type_key(),
            expected.type_key(),
        ];
        let comparator = self.configuration.comparator_for(&pair.location, &types)?;

        if let Some(verdict) = comparator.compare(pair.actual.as_any(), pair.expected.as_any()) {
            return Some(verdict);
        }
        if let Some(verdict) = comparator.compare(actual.as_any(), expected.as_any()) {
            return Some(verdict);
        }
        if either_null {
            return None;
        }
        warn!(
            "{} cannot compare {} with {} at {}, the values are considered different",
            comparator.description(),
            pair.actual.type_key(),
            pair.expected.type_key(),
            pair.location
        );
        Some(false)
    }

    fn violates_strict_types(&self, pair: &Pair<'_>, actual_node: &Node<'_>) -> bool {
        let checked = match self.configuration.strict_type_checking() {
            StrictTypeChecking::Disabled => false,
            StrictTypeChecking::Enabled => true,
            StrictTypeChecking::ActualIterable => {
                pair.location.depth() == 0
                    && matches!(actual_node, Node::Sequence(_) | Node::Map(_))
            }
        };
        checked && pair.actual.type_key() != pair.expected.type_key()
    }

    fn compare_scalar<'a>(
        &self,
        pair: &Pair<'a>,
        actual_node: &Node<'a>,
        expected: Scalar<'a>,
        state: &mut ComparisonState<'_, 'a>,
    ) -> Result<()> {
        let verdict = match (actual_node, expected) {
            (Node::Scalar(actual), _) => actual.value_eq(&expected),
            (Node::Variant(variant), Scalar::Str(name))
                if self.configuration.allows_enum_compared_to_string()
                    && variant.fields.is_empty() =>
            {
                Some(variant.name == name)
            }
            _ => None,
        };

        match verdict {
            Some(true) => {}
            Some(false) => state.record(|| self.difference(pair, DifferenceKind::ValueMismatch)),
            None => state.record(|| {
                self.difference(pair, DifferenceKind::TypeMismatch)
                    .with_description(shape_error(expected.kind(), pair.actual))
            }),
        }
        Ok(())
    }

    fn compare_variant<'a>(
        &self,
        pair: &Pair<'a>,
        actual_node: Node<'a>,
        expected: Variant<'a>,
        state: &mut ComparisonState<'_, 'a>,
    ) -> Result<()> {
        match actual_node {
            Node::Variant(actual) if actual.name == expected.name => {
                return self.compare_fields(pair, &actual.fields, &expected.fields, state);
            }
            Node::Variant(_) => {
                state.record(|| self.difference(pair, DifferenceKind::ValueMismatch));
            }
            Node::Scalar(Scalar::Str(name))
                if self.configuration.allows_enum_compared_to_string()
                    && expected.fields.is_empty() =>
            {
                if name != expected.name {
                    state.record(|| self.difference(pair, DifferenceKind::ValueMismatch));
                }
            }
            _ => state.record(|| {
                self.difference(pair, DifferenceKind::TypeMismatch)
                    .with_description(shape_error("an enum variant", pair.actual))
            }),
        }
        Ok(())
    }

    /// Compares the fields of `expected` with the same-named fields of `actual`.
    /// Fields only `actual` has are not visited.
    fn compare_fields<'a>(
        &self,
        pair: &Pair<'a>,
        actual_fields: &[Field<'a>],
        expected_fields: &[Field<'a>],
        state: &mut ComparisonState<'_, 'a>,
    ) -> Result<()> {
        let strategy = self.configuration.introspection_strategy();
        let expected_children = strategy.children(pair.expected.type_key(), expected_fields)?;
        let actual_children = strategy.children(pair.actual.type_key(), actual_fields)?;

        let mut children = Vec::with_capacity(expected_children.len());
        let mut missing = Vec::new();
        for expected_child in expected_children {
            let location = pair.location.field(&*expected_child.name);
            if self.configuration.is_ignored_field(&location)
                || !self.configuration.is_compared_field(&location)
            {
                continue;
            }
            match actual_children
                .iter()
                .find(|child| child.name == expected_child.name)
            {
                Some(actual_child) => {
                    if !self.ignored_by_value(actual_child.value, expected_child.value) {
                        children.push(DualValue::new(
                            location,
                            actual_child.value,
                            expected_child.value,
                        ));
                    }
                }
                None => missing.push(expected_child.name),
            }
        }

        if !missing.is_empty() {
            state.record(|| {
                self.difference(pair, DifferenceKind::MissingFields)
                    .with_description(format!(
                        "actual value had less fields to compare than expected value, it did not have these fields: [{}]",
                        missing.iter().join(", ")
                    ))
            });
            return Ok(());
        }

        state.push_children(children);
        Ok(())
    }

    /// Field skipped because of its value: `None` policies and ignored types.
    fn ignored_by_value(&self, actual: &dyn Introspect, expected: &dyn Introspect) -> bool {
        let configuration = self.configuration;
        if !configuration.has_value_rules() {
            return false;
        }

        let (actual_value, actual_node) = resolve(actual);
        let (expected_value, expected_node) = resolve(expected);
        if (configuration.ignores_all_actual_none_fields() && actual_node.is_null())
            || (configuration.ignores_all_expected_none_fields() && expected_node.is_null())
        {
            return true;
        }

        let candidates = if !actual_node.is_null() {
            [actual_value.type_key(), actual.type_key()]
        } else if !expected_node.is_null() {
            [expected_value.type_key(), expected.type_key()]
        } else {
            [actual.declared_type(), actual.type_key()]
        };
        candidates
            .into_iter()
            .any(|key| configuration.is_ignored_type(key))
    }
}
