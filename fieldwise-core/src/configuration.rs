//! # Recursive Comparison Configuration
//!
//! [`RecursiveComparisonConfiguration`] holds the comparison policy: what to
//! ignore, which comparators override natural equality, how collections and
//! types are treated. It is built once through the fluent [`Builder`] and is
//! immutable afterwards.
//!
//! ## Rule precedence
//!
//! ```text
//! ignored (path / regex / type / None policy)   never scheduled, nothing else applies
//!         |
//! field comparator (exact rule path)
//!         |
//! regex field comparator
//!         |
//! type comparator
//!         |
//! structural comparison
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fieldwise::configuration::RecursiveComparisonConfiguration;
//!
//! let configuration = RecursiveComparisonConfiguration::builder()
//!     .ignoring_fields(["id", "home.address.number"])
//!     .ignoring_collection_order_in_fields(["friends"])
//!     .with_equals_for_fields(|a: &f64, b: &f64| (a - b).abs() < 0.01, ["height"])
//!     .build()?;
//! ```

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use regex::Regex;
use std::{any::Any, cmp::Ordering, fmt, sync::Arc};

use crate::{
    config::RecursiveComparisonDefaults,
    introspection::{FieldByField, IntrospectionStrategy, TypeKey},
    location::{is_element, FieldLocation},
    Error, Result,
};

type CompareFn = dyn Fn(&dyn Any, &dyn Any) -> Option<bool> + Send + Sync;

/// A user supplied comparison for values of one type.
///
/// The verdict is `None` when the compared values are not of the type the
/// comparator was registered for.
#[derive(Clone)]
pub struct ValueComparator {
    compare: Arc<CompareFn>,
    target: TypeKey,
    description: String,
}

impl ValueComparator {
    /// Values are equal when `comparator` returns `Ordering::Equal`.
    pub fn ordering<T, F>(comparator: F) -> ValueComparator
    where
        T: Any,
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let target = TypeKey::of::<T>();
        ValueComparator {
            compare: Arc::new(move |actual: &dyn Any, expected: &dyn Any| {
                let actual = actual.downcast_ref::<T>()?;
                let expected = expected.downcast_ref::<T>()?;
                Some(comparator(actual, expected) == Ordering::Equal)
            }),
            target,
            description: format!("ordering comparator for {target}"),
        }
    }

    /// Values are equal when `predicate` returns `true`.
    pub fn equality<T, F>(predicate: F) -> ValueComparator
    where
        T: Any,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let target = TypeKey::of::<T>();
        ValueComparator {
            compare: Arc::new(move |actual: &dyn Any, expected: &dyn Any| {
                Some(predicate(
                    actual.downcast_ref::<T>()?,
                    expected.downcast_ref::<T>()?,
                ))
            }),
            target,
            description: format!("equality predicate for {target}"),
        }
    }

    pub fn compare(&self, actual: &dyn Any, expected: &dyn Any) -> Option<bool> {
        (self.compare)(actual, expected)
    }

    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for ValueComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// A compiled regex matching whole field paths or type names.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    fn new(source: String) -> Result<Pattern> {
        let regex = Regex::new(&format!("^(?:{source})$"))
            .map_err(|e| Error::Configuration(format!("invalid regex {source:?}: {e}")))?;
        Ok(Pattern { source, regex })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrictTypeChecking {
    /// Values are compared structurally whatever their types.
    #[default]
    Disabled,
    /// Only the type of a top-level actual collection or map must match the expected one.
    ActualIterable,
    /// Every pair of compared values must have the same runtime type.
    Enabled,
}

#[derive(Debug, Clone)]
pub struct RecursiveComparisonConfiguration {
    ignored_fields: IndexSet<String>,
    ignored_field_patterns: Vec<Pattern>,
    ignored_types: IndexSet<TypeKey>,
    ignored_type_patterns: Vec<Pattern>,
    compared_fields: IndexSet<String>,
    compared_types: IndexSet<TypeKey>,
    ignore_collection_order: bool,
    ignored_collection_order_fields: IndexSet<String>,
    ignored_collection_order_patterns: Vec<Pattern>,
    ignore_array_order: bool,
    field_comparators: IndexMap<String, ValueComparator>,
    field_pattern_comparators: Vec<(Pattern, ValueComparator)>,
    type_comparators: IndexMap<TypeKey, ValueComparator>,
    field_messages: IndexMap<String, String>,
    type_messages: IndexMap<TypeKey, String>,
    strict_type_checking: StrictTypeChecking,
    allow_expected_array: bool,
    ignore_all_actual_none_fields: bool,
    ignore_all_expected_none_fields: bool,
    allow_enum_compared_to_string: bool,
    treat_none_and_empty_collections_as_equal: bool,
    use_partial_eq: bool,
    ignored_partial_eq_types: IndexSet<TypeKey>,
    ignored_partial_eq_fields: IndexSet<String>,
    ignored_partial_eq_field_patterns: Vec<Pattern>,
    introspection_strategy: Arc<dyn IntrospectionStrategy>,
}

impl Default for RecursiveComparisonConfiguration {
    fn default() -> Self {
        RecursiveComparisonConfiguration {
            ignored_fields: IndexSet::new(),
            ignored_field_patterns: Vec::new(),
            ignored_types: IndexSet::new(),
            ignored_type_patterns: Vec::new(),
            compared_fields: IndexSet::new(),
            compared_types: IndexSet::new(),
            ignore_collection_order: false,
            ignored_collection_order_fields: IndexSet::new(),
            ignored_collection_order_patterns: Vec::new(),
            ignore_array_order: false,
            field_comparators: IndexMap::new(),
            field_pattern_comparators: Vec::new(),
            type_comparators: IndexMap::new(),
            field_messages: IndexMap::new(),
            type_messages: IndexMap::new(),
            strict_type_checking: StrictTypeChecking::Disabled,
            allow_expected_array: false,
            ignore_all_actual_none_fields: false,
            ignore_all_expected_none_fields: false,
            allow_enum_compared_to_string: false,
            treat_none_and_empty_collections_as_equal: false,
            use_partial_eq: false,
            ignored_partial_eq_types: IndexSet::new(),
            ignored_partial_eq_fields: IndexSet::new(),
            ignored_partial_eq_field_patterns: Vec::new(),
            introspection_strategy: Arc::new(FieldByField),
        }
    }
}

impl RecursiveComparisonConfiguration {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// A configuration carrying only the process-wide defaults.
    pub fn from_defaults(defaults: &RecursiveComparisonDefaults) -> Self {
        RecursiveComparisonConfiguration {
            strict_type_checking: if defaults.strict_type_checking {
                StrictTypeChecking::Enabled
            } else {
                StrictTypeChecking::Disabled
            },
            ignore_collection_order: defaults.ignore_collection_order,
            allow_expected_array: defaults.allow_expected_array,
            ..Default::default()
        }
    }

    /// True if the value at `location` must not be compared, by path or path regex.
    pub fn is_ignored_field(&self, location: &FieldLocation) -> bool {
        if self.ignored_fields.is_empty() && self.ignored_field_patterns.is_empty() {
            return false;
        }
        self.ignored_fields
            .iter()
            .any(|path| location.hierarchy_matches(path))
            || self
                .ignored_field_patterns
                .iter()
                .any(|pattern| location.hierarchy_matches_regex(&pattern.regex))
    }

    /// True unless compared-only fields were given and `location` is neither one of them,
    /// beneath one of them, nor on the way to one of them. Always true once compared
    /// types are given, since any field may hold a value of a compared type.
    pub fn is_compared_field(&self, location: &FieldLocation) -> bool {
        if self.compared_fields.is_empty() || !self.compared_types.is_empty() || location.is_root()
        {
            return true;
        }
        let rule_path = location.rule_path();
        self.compared_fields.iter().any(|field| {
            location.hierarchy_matches(field)
                || (field.len() > rule_path.len()
                    && field.starts_with(&rule_path)
                    && field.as_bytes()[rule_path.len()] == b'.')
        })
    }

    pub fn compared_fields(&self) -> impl Iterator<Item = &str> {
        self.compared_fields.iter().map(String::as_str)
    }

    /// True if `location` is a compared-only field or lies beneath one.
    pub fn is_within_compared_field(&self, location: &FieldLocation) -> bool {
        self.compared_fields
            .iter()
            .any(|field| location.hierarchy_matches(field))
    }

    /// When compared types are given, only differences found inside values of those
    /// types (or inside compared-only fields) are reported.
    pub fn has_compared_types(&self) -> bool {
        !self.compared_types.is_empty()
    }

    pub fn compared_types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.compared_types.iter().copied()
    }

    pub fn is_compared_type(&self, key: TypeKey) -> bool {
        self.compared_types.contains(&key)
    }

    /// True when fields may be skipped because of their value or type rather than their path.
    pub fn has_value_rules(&self) -> bool {
        self.ignore_all_actual_none_fields
            || self.ignore_all_expected_none_fields
            || !self.ignored_types.is_empty()
            || !self.ignored_type_patterns.is_empty()
    }

    pub fn is_ignored_type(&self, key: TypeKey) -> bool {
        self.ignored_types.contains(&key)
            || self
                .ignored_type_patterns
                .iter()
                .any(|pattern| pattern.regex.is_match(key.name()))
    }

    pub fn ignores_collection_order(&self, location: &FieldLocation) -> bool {
        self.ignore_collection_order
            || self
                .ignored_collection_order_fields
                .iter()
                .any(|path| location.hierarchy_matches(path))
            || self
                .ignored_collection_order_patterns
                .iter()
                .any(|pattern| location.hierarchy_matches_regex(&pattern.regex))
    }

    pub fn ignores_array_order(&self, location: &FieldLocation) -> bool {
        self.ignore_array_order || self.ignores_collection_order(location)
    }

    /// Finds the comparator for the value at `location` whose candidate types are `types`.
    /// Field comparators win over regex field comparators, which win over type comparators.
    pub fn comparator_for(
        &self,
        location: &FieldLocation,
        types: &[TypeKey],
    ) -> Option<&ValueComparator> {
        if !self.field_comparators.is_empty() || !self.field_pattern_comparators.is_empty() {
            let rule_path = location.rule_path();
            if let Some(comparator) = self.field_comparators.get(&rule_path) {
                return Some(comparator);
            }
            if let Some((_, comparator)) = self
                .field_pattern_comparators
                .iter()
                .find(|(pattern, _)| pattern.regex.is_match(&rule_path))
            {
                return Some(comparator);
            }
        }
        types
            .iter()
            .find_map(|key| self.type_comparators.get(key))
    }

    /// Custom error message for a difference at `location`, field messages first.
    pub fn error_message_for(&self, location: &FieldLocation, types: &[TypeKey]) -> Option<&str> {
        if !self.field_messages.is_empty() {
            if let Some(message) = self.field_messages.get(&location.rule_path()) {
                return Some(message);
            }
        }
        types
            .iter()
            .find_map(|key| self.type_messages.get(key))
            .map(String::as_str)
    }

    pub fn has_custom_messages(&self) -> bool {
        !self.field_messages.is_empty() || !self.type_messages.is_empty()
    }

    pub fn strict_type_checking(&self) -> StrictTypeChecking {
        self.strict_type_checking
    }

    pub fn allows_expected_array(&self) -> bool {
        self.allow_expected_array
    }

    pub fn ignores_all_actual_none_fields(&self) -> bool {
        self.ignore_all_actual_none_fields
    }

    pub fn ignores_all_expected_none_fields(&self) -> bool {
        self.ignore_all_expected_none_fields
    }

    pub fn allows_enum_compared_to_string(&self) -> bool {
        self.allow_enum_compared_to_string
    }

    pub fn treats_none_and_empty_collections_as_equal(&self) -> bool {
        self.treat_none_and_empty_collections_as_equal
    }

    pub fn uses_partial_eq(&self) -> bool {
        self.use_partial_eq
    }

    /// Whether the value of type `key` at `location` is compared with its opted-in
    /// `PartialEq` instead of field by field. Never at the root, and only on the
    /// compared-only fields themselves when some were given.
    pub fn uses_partial_eq_for(&self, location: &FieldLocation, key: TypeKey) -> bool {
        if !self.use_partial_eq || location.is_root() {
            return false;
        }
        let rule_path = location.rule_path();
        if !self.compared_fields.is_empty() && !self.compared_fields.contains(&rule_path) {
            return false;
        }
        !(self.ignored_partial_eq_types.contains(&key)
            || self.ignored_partial_eq_fields.contains(&rule_path)
            || self
                .ignored_partial_eq_field_patterns
                .iter()
                .any(|pattern| pattern.regex.is_match(&rule_path)))
    }

    pub fn introspection_strategy(&self) -> &dyn IntrospectionStrategy {
        self.introspection_strategy.as_ref()
    }

    /// Deterministic description of this configuration, one rule per line.
    pub fn multi_line_description(&self) -> String {
        let mut lines = Vec::new();

        if self.ignore_all_actual_none_fields {
            lines.push("- all actual None fields were ignored in the comparison".to_string());
        }
        if self.ignore_all_expected_none_fields {
            lines.push("- all expected None fields were ignored in the comparison".to_string());
        }
        if !self.ignored_fields.is_empty() {
            lines.push(format!(
                "- the following fields were ignored in the comparison: {}",
                self.ignored_fields.iter().join(", ")
            ));
        }
        if !self.ignored_field_patterns.is_empty() {
            lines.push(format!(
                "- the fields matching the following regexes were ignored in the comparison: {}",
                self.ignored_field_patterns.iter().map(Pattern::source).join(", ")
            ));
        }
        if !self.ignored_types.is_empty() {
            lines.push(format!(
                "- the following types were ignored in the comparison: {}",
                self.ignored_types.iter().join(", ")
            ));
        }
        if !self.ignored_type_patterns.is_empty() {
            lines.push(format!(
                "- the types matching the following regexes were ignored in the comparison: {}",
                self.ignored_type_patterns.iter().map(Pattern::source).join(", ")
            ));
        }
        if !self.compared_fields.is_empty() {
            lines.push(format!(
                "- the comparison was performed on the following fields: {}",
                self.compared_fields.iter().join(", ")
            ));
        }
        if !self.compared_types.is_empty() {
            lines.push(format!(
                "- the comparison was performed on any fields with types: {}",
                self.compared_types.iter().join(", ")
            ));
        }
        if self.ignore_collection_order {
            lines.push("- collection order was ignored in all fields in the comparison".to_string());
        }
        if !self.ignored_collection_order_fields.is_empty() {
            lines.push(format!(
                "- collection order was ignored in the following fields in the comparison: {}",
                self.ignored_collection_order_fields.iter().join(", ")
            ));
        }
        if !self.ignored_collection_order_patterns.is_empty() {
            lines.push(format!(
                "- collection order was ignored in the fields matching the following regexes in the comparison: {}",
                self.ignored_collection_order_patterns.iter().map(Pattern::source).join(", ")
            ));
        }
        if self.ignore_array_order {
            lines.push("- array order was ignored in all fields in the comparison".to_string());
        }
        if self.allow_expected_array {
            lines.push(
                "- expected arrays were allowed to be compared to actual collections".to_string(),
            );
        }
        if self.treat_none_and_empty_collections_as_equal {
            lines.push("- None and empty collections were considered equal".to_string());
        }
        if self.use_partial_eq {
            let mut exceptions = Vec::new();
            if !self.ignored_partial_eq_fields.is_empty() {
                exceptions.push(format!(
                    "  - the following fields: {}",
                    self.ignored_partial_eq_fields.iter().join(", ")
                ));
            }
            if !self.ignored_partial_eq_types.is_empty() {
                exceptions.push(format!(
                    "  - the following types: {}",
                    self.ignored_partial_eq_types.iter().join(", ")
                ));
            }
            if !self.ignored_partial_eq_field_patterns.is_empty() {
                exceptions.push(format!(
                    "  - the fields matching the following regexes: {}",
                    self.ignored_partial_eq_field_patterns.iter().map(Pattern::source).join(", ")
                ));
            }
            let header = "- PartialEq was used to compare the values of types opting in with #[introspect(partial_eq)]";
            if exceptions.is_empty() {
                lines.push(header.to_string());
            } else {
                lines.push(format!("{header} except for:"));
                lines.extend(exceptions);
            }
        }
        if self.allow_enum_compared_to_string {
            lines.push(
                "- unit enum variants were allowed to be compared to strings holding their name"
                    .to_string(),
            );
        }
        if !self.type_comparators.is_empty() {
            lines.push("- these types were compared with the following comparators:".to_string());
            for (key, comparator) in &self.type_comparators {
                lines.push(format!("  - {key} -> {}", comparator.description));
            }
        }
        if !self.field_comparators.is_empty() {
            lines.push("- these fields were compared with the following comparators:".to_string());
            for (path, comparator) in &self.field_comparators {
                lines.push(format!("  - {path} -> {}", comparator.description));
            }
        }
        if !self.field_pattern_comparators.is_empty() {
            lines.push(
                "- the fields matching these regexes were compared with the following comparators:"
                    .to_string(),
            );
            for (pattern, comparator) in &self.field_pattern_comparators {
                lines.push(format!("  - {} -> {}", pattern.source, comparator.description));
            }
        }
        if !self.type_comparators.is_empty()
            && (!self.field_comparators.is_empty() || !self.field_pattern_comparators.is_empty())
        {
            lines.push("- field comparators take precedence over type comparators.".to_string());
        }
        if !self.field_messages.is_empty() {
            lines.push("- the following error messages were used for these fields:".to_string());
            for (path, message) in &self.field_messages {
                lines.push(format!("  - {path} -> {message}"));
            }
        }
        if !self.type_messages.is_empty() {
            lines.push("- the following error messages were used for these types:".to_string());
            for (key, message) in &self.type_messages {
                lines.push(format!("  - {key} -> {message}"));
            }
        }
        lines.push(match self.strict_type_checking {
            StrictTypeChecking::Disabled => "- actual and expected objects and their fields were compared field by field recursively even if they were not of the same type, this allows for example to compare a Person to a PersonDto (call with_strict_type_checking() to change that behavior).".to_string(),
            StrictTypeChecking::ActualIterable => "- the actual collection was required to be of the same type as the expected one, its elements were compared field by field recursively even if they were not of the same type.".to_string(),
            StrictTypeChecking::Enabled => "- actual and expected objects and their fields were considered different when of different types even if all their fields match, for example a Person instance will never match a PersonDto.".to_string(),
        });
        lines.push(format!(
            "- the introspection strategy used was: {}",
            self.introspection_strategy.description()
        ));

        lines.join("\n")
    }
}

/// Fluent builder for [`RecursiveComparisonConfiguration`]. Paths and regexes are
/// validated by [`Builder::build`].
#[derive(Debug, Clone)]
pub struct Builder {
    ignored_fields: Vec<String>,
    ignored_field_regexes: Vec<String>,
    ignored_types: Vec<TypeKey>,
    ignored_type_regexes: Vec<String>,
    compared_fields: Vec<String>,
    compared_types: Vec<TypeKey>,
    ignore_collection_order: bool,
    ignored_collection_order_fields: Vec<String>,
    ignored_collection_order_regexes: Vec<String>,
    ignore_array_order: bool,
    field_comparators: Vec<(String, ValueComparator)>,
    field_regex_comparators: Vec<(String, ValueComparator)>,
    type_comparators: Vec<(TypeKey, ValueComparator)>,
    field_messages: Vec<(String, String)>,
    type_messages: Vec<(TypeKey, String)>,
    strict_type_checking: StrictTypeChecking,
    allow_expected_array: bool,
    ignore_all_actual_none_fields: bool,
    ignore_all_expected_none_fields: bool,
    allow_enum_compared_to_string: bool,
    treat_none_and_empty_collections_as_equal: bool,
    use_partial_eq: bool,
    ignored_partial_eq_types: Vec<TypeKey>,
    ignored_partial_eq_fields: Vec<String>,
    ignored_partial_eq_field_regexes: Vec<String>,
    introspection_strategy: Arc<dyn IntrospectionStrategy>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::from(&RecursiveComparisonConfiguration::default())
    }
}

fn strings<I, S>(values: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into)
}

impl Builder {
    /// Starts from the process-wide defaults.
    pub fn from_defaults(defaults: &RecursiveComparisonDefaults) -> Builder {
        Builder::from(&RecursiveComparisonConfiguration::from_defaults(defaults))
    }

    /// Ignores the given field paths and everything beneath them.
    pub fn ignoring_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_fields.extend(strings(paths));
        self
    }

    /// Ignores fields whose whole path matches one of the regexes.
    pub fn ignoring_fields_matching_regexes<I, S>(mut self, regexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_field_regexes.extend(strings(regexes));
        self
    }

    pub fn ignoring_fields_of_type<T: Any>(mut self) -> Self {
        self.ignored_types.push(TypeKey::of::<T>());
        self
    }

    /// Ignores fields whose type name (as in `std::any::type_name`) matches one of the regexes.
    pub fn ignoring_fields_of_types_matching_regexes<I, S>(mut self, regexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_type_regexes.extend(strings(regexes));
        self
    }

    pub fn ignoring_collection_order(mut self) -> Self {
        self.ignore_collection_order = true;
        self
    }

    pub fn ignoring_collection_order_in_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_collection_order_fields.extend(strings(paths));
        self
    }

    pub fn ignoring_collection_order_in_fields_matching_regexes<I, S>(mut self, regexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_collection_order_regexes.extend(strings(regexes));
        self
    }

    pub fn ignoring_array_order(mut self) -> Self {
        self.ignore_array_order = true;
        self
    }

    /// Restricts the comparison to the given fields (and the fields beneath them).
    pub fn comparing_only_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compared_fields.extend(strings(paths));
        self
    }

    /// Restricts the reported differences to values of type `T`, everything inside
    /// them, and the compared-only fields if any. Can be called for several types.
    pub fn comparing_only_fields_of_type<T: Any>(mut self) -> Self {
        self.compared_types.push(TypeKey::of::<T>());
        self
    }

    pub fn with_comparator_for_fields<T, F, I, S>(mut self, comparator: F, paths: I) -> Self
    where
        T: Any,
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let comparator = ValueComparator::ordering(comparator);
        self.field_comparators
            .extend(strings(paths).map(|path| (path, comparator.clone())));
        self
    }

    pub fn with_equals_for_fields<T, F, I, S>(mut self, predicate: F, paths: I) -> Self
    where
        T: Any,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let comparator = ValueComparator::equality(predicate);
        self.field_comparators
            .extend(strings(paths).map(|path| (path, comparator.clone())));
        self
    }

    pub fn with_equals_for_fields_matching_regexes<T, F, I, S>(
        mut self,
        predicate: F,
        regexes: I,
    ) -> Self
    where
        T: Any,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let comparator = ValueComparator::equality(predicate);
        self.field_regex_comparators
            .extend(strings(regexes).map(|regex| (regex, comparator.clone())));
        self
    }

    pub fn with_comparator_for_type<T, F>(mut self, comparator: F) -> Self
    where
        T: Any,
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.type_comparators
            .push((TypeKey::of::<T>(), ValueComparator::ordering(comparator)));
        self
    }

    pub fn with_equals_for_type<T, F>(mut self, predicate: F) -> Self
    where
        T: Any,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.type_comparators
            .push((TypeKey::of::<T>(), ValueComparator::equality(predicate)));
        self
    }

    /// Replaces the report of a difference at the given fields with `message`.
    pub fn with_error_message_for_fields<I, S>(mut self, message: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let message = message.into();
        self.field_messages
            .extend(strings(paths).map(|path| (path, message.clone())));
        self
    }

    pub fn with_error_message_for_type<T: Any>(mut self, message: impl Into<String>) -> Self {
        self.type_messages.push((TypeKey::of::<T>(), message.into()));
        self
    }

    pub fn with_strict_type_checking(mut self) -> Self {
        self.strict_type_checking = StrictTypeChecking::Enabled;
        self
    }

    pub fn with_strict_type_checking_on_actual_iterable(mut self) -> Self {
        self.strict_type_checking = StrictTypeChecking::ActualIterable;
        self
    }

    /// Lets an expected array be compared to any actual collection.
    pub fn allowing_array_type_for_expected(mut self) -> Self {
        self.allow_expected_array = true;
        self
    }

    pub fn ignoring_all_actual_none_fields(mut self) -> Self {
        self.ignore_all_actual_none_fields = true;
        self
    }

    pub fn ignoring_all_expected_none_fields(mut self) -> Self {
        self.ignore_all_expected_none_fields = true;
        self
    }

    pub fn allowing_enum_compared_to_string(mut self) -> Self {
        self.allow_enum_compared_to_string = true;
        self
    }

    /// A `None` on one side and an empty collection on the other (or both empty) are equal.
    pub fn treating_none_and_empty_collections_as_equal(mut self) -> Self {
        self.treat_none_and_empty_collections_as_equal = true;
        self
    }

    /// Compares values of types deriving `Introspect` with `#[introspect(partial_eq)]`
    /// through their `PartialEq` instead of field by field. The root values are
    /// always compared field by field.
    pub fn using_partial_eq(mut self) -> Self {
        self.use_partial_eq = true;
        self
    }

    /// Compares every value field by field, whatever `PartialEq` it opted in.
    pub fn ignoring_all_partial_eq(mut self) -> Self {
        self.use_partial_eq = false;
        self
    }

    pub fn ignoring_partial_eq_for_type<T: Any>(mut self) -> Self {
        self.ignored_partial_eq_types.push(TypeKey::of::<T>());
        self
    }

    pub fn ignoring_partial_eq_for_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_partial_eq_fields.extend(strings(paths));
        self
    }

    pub fn ignoring_partial_eq_for_fields_matching_regexes<I, S>(mut self, regexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_partial_eq_field_regexes.extend(strings(regexes));
        self
    }

    pub fn with_introspection_strategy(
        mut self,
        strategy: impl IntrospectionStrategy + 'static,
    ) -> Self {
        self.introspection_strategy = Arc::new(strategy);
        self
    }

    pub fn build(self) -> Result<RecursiveComparisonConfiguration> {
        Ok(RecursiveComparisonConfiguration {
            ignored_fields: paths(self.ignored_fields)?,
            ignored_field_patterns: patterns(self.ignored_field_regexes)?,
            ignored_types: self.ignored_types.into_iter().collect(),
            ignored_type_patterns: patterns(self.ignored_type_regexes)?,
            compared_fields: paths(self.compared_fields)?,
            compared_types: self.compared_types.into_iter().collect(),
            ignore_collection_order: self.ignore_collection_order,
            ignored_collection_order_fields: paths(self.ignored_collection_order_fields)?,
            ignored_collection_order_patterns: patterns(self.ignored_collection_order_regexes)?,
            ignore_array_order: self.ignore_array_order,
            field_comparators: self
                .field_comparators
                .into_iter()
                .map(|(path, comparator)| Ok((rule_path(&path)?, comparator)))
                .collect::<Result<_>>()?,
            field_pattern_comparators: self
                .field_regex_comparators
                .into_iter()
                .map(|(regex, comparator)| Ok((Pattern::new(regex)?, comparator)))
                .collect::<Result<_>>()?,
            type_comparators: self.type_comparators.into_iter().collect(),
            field_messages: self
                .field_messages
                .into_iter()
                .map(|(path, message)| Ok((rule_path(&path)?, message)))
                .collect::<Result<_>>()?,
            type_messages: self.type_messages.into_iter().collect(),
            strict_type_checking: self.strict_type_checking,
            allow_expected_array: self.allow_expected_array,
            ignore_all_actual_none_fields: self.ignore_all_actual_none_fields,
            ignore_all_expected_none_fields: self.ignore_all_expected_none_fields,
            allow_enum_compared_to_string: self.allow_enum_compared_to_string,
            treat_none_and_empty_collections_as_equal: self
                .treat_none_and_empty_collections_as_equal,
            use_partial_eq: self.use_partial_eq,
            ignored_partial_eq_types: self.ignored_partial_eq_types.into_iter().collect(),
            ignored_partial_eq_fields: paths(self.ignored_partial_eq_fields)?,
            ignored_partial_eq_field_patterns: patterns(self.ignored_partial_eq_field_regexes)?,
            introspection_strategy: self.introspection_strategy,
        })
    }
}

impl From<&RecursiveComparisonConfiguration> for Builder {
    fn from(configuration: &RecursiveComparisonConfiguration) -> Self {
        Builder {
            ignored_fields: configuration.ignored_fields.iter().cloned().collect(),
            ignored_field_regexes: sources(&configuration.ignored_field_patterns),
            ignored_types: configuration.ignored_types.iter().copied().collect(),
            ignored_type_regexes: sources(&configuration.ignored_type_patterns),
            compared_fields: configuration.compared_fields.iter().cloned().collect(),
            compared_types: configuration.compared_types.iter().copied().collect(),
            ignore_collection_order: configuration.ignore_collection_order,
            ignored_collection_order_fields: configuration
                .ignored_collection_order_fields
                .iter()
                .cloned()
                .collect(),
            ignored_collection_order_regexes: sources(
                &configuration.ignored_collection_order_patterns,
            ),
            ignore_array_order: configuration.ignore_array_order,
            field_comparators: configuration
                .field_comparators
                .iter()
                .map(|(path, comparator)| (path.clone(), comparator.clone()))
                .collect(),
            field_regex_comparators: configuration
                .field_pattern_comparators
                .iter()
                .map(|(pattern, comparator)| (pattern.source.clone(), comparator.clone()))
                .collect(),
            type_comparators: configuration
                .type_comparators
                .iter()
                .map(|(key, comparator)| (*key, comparator.clone()))
                .collect(),
            field_messages: configuration
                .field_messages
                .iter()
                .map(|(path, message)| (path.clone(), message.clone()))
                .collect(),
            type_messages: configuration
                .type_messages
                .iter()
                .map(|(key, message)| (*key, message.clone()))
                .collect(),
            strict_type_checking: configuration.strict_type_checking,
            allow_expected_array: configuration.allow_expected_array,
            ignore_all_actual_none_fields: configuration.ignore_all_actual_none_fields,
            ignore_all_expected_none_fields: configuration.ignore_all_expected_none_fields,
            allow_enum_compared_to_string: configuration.allow_enum_compared_to_string,
            treat_none_and_empty_collections_as_equal: configuration
                .treat_none_and_empty_collections_as_equal,
            use_partial_eq: configuration.use_partial_eq,
            ignored_partial_eq_types: configuration.ignored_partial_eq_types.iter().copied().collect(),
            ignored_partial_eq_fields: configuration
                .ignored_partial_eq_fields
                .iter()
                .cloned()
                .collect(),
            ignored_partial_eq_field_regexes: sources(
                &configuration.ignored_partial_eq_field_patterns,
            ),
            introspection_strategy: Arc::clone(&configuration.introspection_strategy),
        }
    }
}

fn sources(patterns: &[Pattern]) -> Vec<String> {
    patterns.iter().map(|p| p.source.clone()).collect()
}

/// Drops element segments so that `children.[0].name` is stored as `children.name`.
fn rule_path(path: &str) -> Result<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(Error::Configuration(
            "field paths must not be empty".to_string(),
        ));
    }
    let segments: Vec<_> = trimmed
        .split('.')
        .filter(|segment| !is_element(segment))
        .collect();
    if segments.is_empty() || segments.iter().any(|segment| segment.is_empty()) {
        return Err(Error::Configuration(format!(
            "field path {path:?} has an empty segment"
        )));
    }
    Ok(segments.join("."))
}

fn paths(paths: Vec<String>) -> Result<IndexSet<String>> {
    paths.iter().map(|path| rule_path(path)).collect()
}

fn patterns(regexes: Vec<String>) -> Result<Vec<Pattern>> {
    regexes.into_iter().map(Pattern::new).collect()
}
