//! Sequence and map comparison.
//!
//! Ordered collections are compared element by element at `field.[i]`. Unordered
//! ones are matched as multisets: every expected element consumes the first
//! unmatched actual element it equals, equality being decided by a trial
//! sub-comparison that shares the active visited pairs.
//!
//! Map entries are paired by key equality. The key label only names the entry
//! in field paths.

use itertools::Itertools;
use tracing::*;

use crate::{
    calculator::{shape_error, simple_type_name, Comparison, Pair},
    difference::DifferenceKind,
    introspection::{resolve, Field, Introspect, MapNode, Node, Scalar, Sequence, SequenceKind},
    location::FieldLocation,
    state::{ComparisonState, DualValue},
    Result,
};

const ORDERED_COLLECTIONS: &str = "[Vec, VecDeque, LinkedList, BTreeSet, IndexSet, arrays]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    Positional,
    Unordered,
}

/// Type name without module paths or generic arguments: `Vec`, `HashSet`.
fn container_name(value: &dyn Introspect) -> String {
    let simple = simple_type_name(value.type_key().name());
    match simple.split_once('<') {
        Some((name, _)) => name.to_string(),
        None => simple,
    }
}

/// Name of the map entry field: the raw string for string keys, the value or
/// variant name for other scalar-like keys, the `Debug` rendering otherwise.
fn key_label(key: &dyn Introspect) -> String {
    match resolve(key).1 {
        Node::Scalar(Scalar::Str(name)) => name.to_string(),
        Node::Scalar(scalar) => scalar.to_string(),
        Node::Variant(variant) if variant.fields.is_empty() => variant.name.to_string(),
        _ => format!("{key:?}"),
    }
}

/// Whether two map keys designate the same entry. Scalars compare by value, so
/// `1u8` and `1u64` are the same key but `"1"` and `1` are not. Other shapes
/// compare structurally.
fn same_key(actual: &dyn Introspect, expected: &dyn Introspect) -> bool {
    match (resolve(actual).1, resolve(expected).1) {
        (Node::Null, Node::Null) => true,
        (Node::Scalar(actual), Node::Scalar(expected)) => actual.value_eq(&expected) == Some(true),
        (Node::Struct(actual), Node::Struct(expected)) => same_fields(&actual, &expected),
        (Node::Variant(actual), Node::Variant(expected)) => {
            actual.name == expected.name && same_fields(&actual.fields, &expected.fields)
        }
        (Node::Sequence(actual), Node::Sequence(expected)) => {
            actual.elements.len() == expected.elements.len()
                && actual
                    .elements
                    .iter()
                    .zip(&expected.elements)
                    .all(|(actual, expected)| same_key(*actual, *expected))
        }
        (Node::Map(actual), Node::Map(expected)) => {
            actual.entries.len() == expected.entries.len()
                && actual.entries.iter().zip(&expected.entries).all(
                    |((actual_key, actual_value), (expected_key, expected_value))| {
                        same_key(*actual_key, *expected_key)
                            && same_key(*actual_value, *expected_value)
                    },
                )
        }
        _ => false,
    }
}

fn same_fields(actual: &[Field<'_>], expected: &[Field<'_>]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(actual, expected)| {
                actual.name == expected.name && same_key(actual.value, expected.value)
            })
}

struct Entry<'a> {
    label: String,
    key: &'a dyn Introspect,
    value: &'a dyn Introspect,
}

impl Comparison<'_> {
    pub(crate) fn compare_sequence<'a>(
        &self,
        pair: &Pair<'a>,
        actual_node: Node<'a>,
        expected: Sequence<'a>,
        state: &mut ComparisonState<'_, 'a>,
    ) -> Result<()> {
        let Node::Sequence(actual) = actual_node else {
            state.record(|| {
                self.difference(pair, DifferenceKind::TypeMismatch)
                    .with_description(shape_error(expected.kind.description(), pair.actual))
            });
            return Ok(());
        };

        let configuration = self.configuration;
        let location = &pair.location;
        let order = match expected.kind {
            SequenceKind::Array => {
                if actual.kind != SequenceKind::Array && !configuration.allows_expected_array() {
                    state.record(|| {
                        self.difference(pair, DifferenceKind::TypeMismatch)
                            .with_description(shape_error("an array", pair.actual))
                    });
                    return Ok(());
                }
                if actual.kind.is_ordered() && !configuration.ignores_array_order(location) {
                    Order::Positional
                } else {
                    Order::Unordered
                }
            }
            SequenceKind::List | SequenceKind::OrderedSet => {
                if configuration.ignores_collection_order(location) {
                    Order::Unordered
                } else if !actual.kind.is_ordered() {
                    state.record(|| {
                        self.difference(pair, DifferenceKind::TypeMismatch)
                            .with_description(format!(
                                "{}, ordered collections are: {ORDERED_COLLECTIONS}",
                                shape_error("an ordered collection", pair.actual)
                            ))
                    });
                    return Ok(());
                } else {
                    Order::Positional
                }
            }
            SequenceKind::Set => Order::Unordered,
        };

        if actual.elements.len() != expected.elements.len() {
            let noun = if expected.kind == SequenceKind::Array {
                "arrays"
            } else {
                "collections"
            };
            state.record(|| {
                self.difference(pair, DifferenceKind::SizeMismatch)
                    .with_description(format!(
                        "actual and expected values are {noun} of different size, actual size={} when expected size={}",
                        actual.elements.len(),
                        expected.elements.len()
                    ))
            });
            return Ok(());
        }

        match order {
            Order::Positional => {
                let children = actual
                    .elements
                    .iter()
                    .zip(&expected.elements)
                    .enumerate()
                    .map(|(index, (actual, expected))| {
                        DualValue::new(location.element(index), *actual, *expected)
                    })
                    .collect();
                state.push_children(children);
                Ok(())
            }
            Order::Unordered => self.compare_unordered(
                pair,
                &actual.elements,
                &expected.elements,
                expected.kind == SequenceKind::Set,
                state,
            ),
        }
    }

    fn compare_unordered<'a>(
        &self,
        pair: &Pair<'a>,
        actual: &[&'a dyn Introspect],
        expected: &[&'a dyn Introspect],
        sort_unmatched: bool,
        state: &mut ComparisonState<'_, 'a>,
    ) -> Result<()> {
        let mut consumed = vec![false; actual.len()];
        let mut unmatched = Vec::new();
        for expected_element in expected {
            let mut matched = None;
            for (index, actual_element) in actual.iter().enumerate() {
                if consumed[index] {
                    continue;
                }
                if self.matches(&pair.location, *actual_element, *expected_element, state)? {
                    matched = Some(index);
                    break;
                }
            }
            match matched {
                Some(index) => consumed[index] = true,
                None => unmatched.push(*expected_element),
            }
        }

        if !unmatched.is_empty() {
            trace!(
                "{} expected element(s) unmatched at {}",
                unmatched.len(),
                pair.location.path_for_report()
            );
            state.record(|| {
                let mut rendered: Vec<String> =
                    unmatched.iter().map(|element| self.render(*element)).collect();
                if sort_unmatched {
                    rendered.sort();
                }
                self.difference(pair, DifferenceKind::UnmatchedElements)
                    .with_description(format!(
                        "The following expected elements were not matched in the actual {}:\n  [{}]",
                        container_name(pair.actual),
                        rendered.join(", ")
                    ))
            });
        }
        Ok(())
    }

    /// Whether `actual` and `expected` compare without any difference.
    fn matches<'a>(
        &self,
        location: &FieldLocation,
        actual: &'a dyn Introspect,
        expected: &'a dyn Introspect,
        state: &mut ComparisonState<'_, 'a>,
    ) -> Result<bool> {
        let mut trial = state.trial();
        trial.push(DualValue::new(location.clone(), actual, expected));
        self.drain(&mut trial)?;
        Ok(!trial.has_mismatch())
    }

    fn entries<'a>(&self, location: &FieldLocation, map: MapNode<'a>) -> Vec<Entry<'a>> {
        map.entries
            .into_iter()
            .map(|(key, value)| Entry {
                label: key_label(key),
                key,
                value,
            })
            .filter(|entry| {
                !self
                    .configuration
                    .is_ignored_field(&location.field(entry.label.as_str()))
            })
            .collect()
    }

    fn key_list(&self, entries: &[&Entry<'_>]) -> String {
        entries
            .iter()
            .map(|entry| self.render(entry.key))
            .sorted()
            .join(", ")
    }

    pub(crate) fn compare_map<'a>(
        &self,
        pair: &Pair<'a>,
        actual_node: Node<'a>,
        expected: MapNode<'a>,
        state: &mut ComparisonState<'_, 'a>,
    ) -> Result<()> {
        let sorted = expected.sorted;
        let actual = match actual_node {
            Node::Map(actual) if actual.sorted || !sorted => actual,
            _ => {
                let shape = if sorted { "a sorted map" } else { "a map" };
                state.record(|| {
                    self.difference(pair, DifferenceKind::TypeMismatch)
                        .with_description(shape_error(shape, pair.actual))
                });
                return Ok(());
            }
        };

        let actual = self.entries(&pair.location, actual);
        let expected = self.entries(&pair.location, expected);
        if sorted {
            self.compare_sorted_map(pair, actual, expected, state);
        } else {
            self.compare_unordered_map(pair, actual, expected, state);
        }
        Ok(())
    }

    fn compare_sorted_map<'a>(
        &self,
        pair: &Pair<'a>,
        actual: Vec<Entry<'a>>,
        expected: Vec<Entry<'a>>,
        state: &mut ComparisonState<'_, 'a>,
    ) {
        if actual.len() != expected.len() {
            state.record(|| {
                self.difference(pair, DifferenceKind::SizeMismatch)
                    .with_description(format!(
                        "actual and expected values are sorted maps of different size, actual size={} when expected size={}",
                        actual.len(),
                        expected.len()
                    ))
            });
            return;
        }

        let mut children = Vec::with_capacity(expected.len());
        for (actual, expected) in actual.into_iter().zip(expected) {
            if !same_key(actual.key, expected.key) {
                state.record(|| {
                    self.difference(pair, DifferenceKind::KeyMismatch)
                        .with_keys(self.render(actual.key), self.render(expected.key))
                });
                continue;
            }
            children.push(DualValue::new(
                pair.location.field(expected.label.as_str()),
                actual.value,
                expected.value,
            ));
        }
        state.push_children(children);
    }

    fn compare_unordered_map<'a>(
        &self,
        pair: &Pair<'a>,
        actual: Vec<Entry<'a>>,
        expected: Vec<Entry<'a>>,
        state: &mut ComparisonState<'_, 'a>,
    ) {
        let mut consumed = vec![false; actual.len()];
        let mut matched = Vec::with_capacity(expected.len());
        let mut missing = Vec::new();
        for expected_entry in &expected {
            let found = (0..actual.len())
                .find(|&index| !consumed[index] && same_key(actual[index].key, expected_entry.key));
            match found {
                Some(index) => {
                    consumed[index] = true;
                    matched.push((&actual[index], expected_entry));
                }
                None => missing.push(expected_entry),
            }
        }
        let extra: Vec<&Entry<'a>> = actual
            .iter()
            .zip(&consumed)
            .filter(|(_, consumed)| !**consumed)
            .map(|(entry, _)| entry)
            .collect();

        if actual.len() != expected.len() || !missing.is_empty() || !extra.is_empty() {
            let kind = if missing.is_empty() && extra.is_empty() {
                DifferenceKind::SizeMismatch
            } else {
                DifferenceKind::MissingKeys
            };
            state.record(|| {
                let mut lines = Vec::new();
                if actual.len() != expected.len() {
                    lines.push(format!(
                        "actual and expected values are maps of different size, actual size={} when expected size={}",
                        actual.len(),
                        expected.len()
                    ));
                }
                if !missing.is_empty() {
                    lines.push(format!(
                        "The following keys were not found in the actual map value:\n  [{}]",
                        self.key_list(&missing)
                    ));
                }
                if !extra.is_empty() {
                    lines.push(format!(
                        "The following keys were present in the actual map value, but not in the expected map value:\n  [{}]",
                        self.key_list(&extra)
                    ));
                }
                self.difference(pair, kind).with_description(lines.join("\n"))
            });
            return;
        }

        let children = matched
            .into_iter()
            .sorted_by(|(_, a), (_, b)| a.label.cmp(&b.label))
            .map(|(actual, expected)| {
                DualValue::new(
                    pair.location.field(expected.label.as_str()),
                    actual.value,
                    expected.value,
                )
            })
            .collect();
        state.push_children(children);
    }
}
