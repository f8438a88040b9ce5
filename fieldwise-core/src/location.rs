//! # Field Location
//!
//! A [`FieldLocation`] identifies a value inside an object graph as an ordered
//! sequence of path segments, e.g. `home.address.number`. Collection elements
//! are addressed by bracketed segments (`children.[2].name`).
//!
//! Configuration rules (ignored fields, comparators, collection order) are
//! matched against the *rule path*, which is the dotted path with element
//! segments removed, so a rule for `children.name` applies to the `name` of
//! every child.
//!
//! Locations are persistent: a child shares its parent's segments, so
//! descending one level costs a single allocation regardless of depth.

use regex::Regex;
use std::{
    cmp::Ordering,
    convert::Infallible,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
    sync::Arc,
};

#[derive(Clone, Default)]
pub struct FieldLocation {
    last: Option<Arc<Segment>>,
}

struct Segment {
    name: String,
    parent: Option<Arc<Segment>>,
    depth: usize,
    rule_depth: usize,
}

impl Drop for Segment {
    // Unlinks the chain iteratively so very deep locations do not overflow the stack.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(segment) = next {
            match Arc::try_unwrap(segment) {
                Ok(mut segment) => next = segment.parent.take(),
                Err(_) => break,
            }
        }
    }
}

pub(crate) fn is_element(segment: &str) -> bool {
    segment.starts_with('[') && segment.ends_with(']')
}

fn element_index(segment: &str) -> Option<usize> {
    if is_element(segment) {
        segment[1..segment.len() - 1].parse().ok()
    } else {
        None
    }
}

impl FieldLocation {
    /// The location of the compared objects themselves.
    pub fn root() -> FieldLocation {
        FieldLocation::default()
    }

    /// Builds a location from an explicit ordered list of segments.
    pub fn new<I, S>(segments: I) -> FieldLocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        segments
            .into_iter()
            .fold(FieldLocation::root(), |location, segment| {
                location.field(segment)
            })
    }

    /// Builds a location from a dotted path such as `"a.b.c"`. The empty string is the root.
    pub fn from_dotted(path: &str) -> FieldLocation {
        if path.is_empty() {
            return FieldLocation::root();
        }
        FieldLocation::new(path.split('.'))
    }

    /// Returns the location of the field `name` beneath this one.
    pub fn field(&self, name: impl Into<String>) -> FieldLocation {
        let name = name.into();
        let (depth, rule_depth) = match &self.last {
            Some(last) => (last.depth, last.rule_depth),
            None => (0, 0),
        };
        let rule_depth = if is_element(&name) {
            rule_depth
        } else {
            rule_depth + 1
        };
        FieldLocation {
            last: Some(Arc::new(Segment {
                name,
                parent: self.last.clone(),
                depth: depth + 1,
                rule_depth,
            })),
        }
    }

    /// Returns the location of the `index`-th element of the collection at this location.
    pub fn element(&self, index: usize) -> FieldLocation {
        self.field(format!("[{index}]"))
    }

    /// Number of segments, element segments included.
    pub fn depth(&self) -> usize {
        self.last.as_ref().map_or(0, |last| last.depth)
    }

    /// Segments from the root down to this location.
    pub fn segments(&self) -> Vec<&str> {
        let mut segments = Vec::with_capacity(self.depth());
        let mut current = self.last.as_deref();
        while let Some(segment) = current {
            segments.push(segment.name.as_str());
            current = segment.parent.as_deref();
        }
        segments.reverse();
        segments
    }

    fn rule_segments(&self) -> Vec<&str> {
        self.segments()
            .into_iter()
            .filter(|segment| !is_element(segment))
            .collect()
    }

    /// The dotted path used to match configuration rules, without element segments.
    pub fn rule_path(&self) -> String {
        self.rule_segments().join(".")
    }

    /// The full dotted path, element segments included.
    pub fn path_for_report(&self) -> String {
        self.segments().join(".")
    }

    /// The last segment, or the empty string for the root.
    pub fn field_name(&self) -> &str {
        self.last.as_ref().map_or("", |last| last.name.as_str())
    }

    /// True for the root and for elements of a top-level collection (`[0]`).
    pub fn is_root(&self) -> bool {
        self.last.as_ref().is_none_or(|last| last.rule_depth == 0)
    }

    /// True for a field declared directly on the root value (or on a top-level element).
    pub fn is_top_level_field(&self) -> bool {
        self.last
            .as_ref()
            .is_some_and(|last| last.rule_depth == 1 && !is_element(&last.name))
    }

    /// Returns true if `path` equals this location's rule path or is a dot-delimited
    /// ancestor of it. `"name"` matches `name.first` but not `names`.
    pub fn hierarchy_matches(&self, path: &str) -> bool {
        let rule_path = self.rule_path();
        rule_path == path
            || (rule_path.len() > path.len()
                && rule_path.starts_with(path)
                && rule_path.as_bytes()[path.len()] == b'.')
    }

    /// Returns true if this location or one of its ancestors matches `regex`.
    pub fn hierarchy_matches_regex(&self, regex: &Regex) -> bool {
        let mut prefix = String::new();
        for segment in self.rule_segments() {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            if regex.is_match(&prefix) {
                return true;
            }
        }
        false
    }

    pub fn matches_regex(&self, regex: &Regex) -> bool {
        regex.is_match(&self.rule_path())
    }

    pub fn exactly_matches(&self, path: &str) -> bool {
        self.rule_path() == path
    }

    /// Returns true if `parent` is a strict ancestor of this location.
    pub fn has_parent(&self, parent: &FieldLocation) -> bool {
        parent.has_child(self)
    }

    /// Returns true if `child` is strictly beneath this location.
    pub fn has_child(&self, child: &FieldLocation) -> bool {
        let own = self.rule_segments();
        let other = child.rule_segments();
        other.len() > own.len() && other.starts_with(&own)
    }
}

impl PartialEq for FieldLocation {
    fn eq(&self, other: &Self) -> bool {
        if self.depth() != other.depth() {
            return false;
        }
        let (mut left, mut right) = (self.last.as_ref(), other.last.as_ref());
        while let (Some(l), Some(r)) = (left, right) {
            if Arc::ptr_eq(l, r) {
                return true;
            }
            if l.name != r.name {
                return false;
            }
            left = l.parent.as_ref();
            right = r.parent.as_ref();
        }
        true
    }
}

impl Eq for FieldLocation {}

impl Hash for FieldLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments().hash(state);
    }
}

impl Ord for FieldLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rule_path().cmp(&other.rule_path()).then_with(|| {
            let left = self.segments();
            let right = other.segments();
            for (l, r) in left.iter().zip(right.iter()) {
                let ordering = match (element_index(l), element_index(r)) {
                    (Some(l), Some(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            left.len().cmp(&right.len())
        })
    }
}

impl PartialOrd for FieldLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.rule_path())
    }
}

impl fmt::Debug for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldLocation")
            .field(&self.path_for_report())
            .finish()
    }
}

impl FromStr for FieldLocation {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldLocation::from_dotted(s))
    }
}

impl From<&str> for FieldLocation {
    fn from(path: &str) -> Self {
        FieldLocation::from_dotted(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::{Duration, Instant};
    use test_case::test_case;

    #[test_case("name.first", "name" => true; "parent path")]
    #[test_case("name", "name" => true; "same path")]
    #[test_case("names", "name" => false; "partial segment")]
    #[test_case("name", "name.first" => false; "child path")]
    #[test_case("children.[2].name", "children.name" => true; "element segments are dropped")]
    #[test_case("children.[2].name", "children" => true; "ancestor of element")]
    #[test_case("", "name" => false; "root")]
    fn hierarchy_matches(location: &str, path: &str) -> bool {
        FieldLocation::from_dotted(location).hierarchy_matches(path)
    }

    #[test_case("" => true; "root")]
    #[test_case("[0]" => true; "top level element")]
    #[test_case("[0].[1]" => true; "nested top level element")]
    #[test_case("[0].name" => false; "field of element")]
    #[test_case("name" => false; "field")]
    fn is_root(location: &str) -> bool {
        FieldLocation::from_dotted(location).is_root()
    }

    #[test_case("name" => true; "field")]
    #[test_case("[3].name" => true; "field of top level element")]
    #[test_case("name.first" => false; "nested field")]
    #[test_case("" => false; "root")]
    fn is_top_level_field(location: &str) -> bool {
        FieldLocation::from_dotted(location).is_top_level_field()
    }

    #[test]
    fn sort_by_dotted_path() {
        let mut locations: Vec<FieldLocation> =
            ["z", "aaa", "a.b", "a"].into_iter().map(Into::into).collect();
        locations.sort();

        let sorted: Vec<_> = locations.iter().map(|l| l.path_for_report()).collect();
        pretty_assertions::assert_eq!(sorted, vec!["a", "a.b", "aaa", "z"]);
    }

    #[test]
    fn sort_elements_numerically() {
        let mut locations: Vec<FieldLocation> = ["[10]", "[2]", "[1].name", "[1]"]
            .into_iter()
            .map(Into::into)
            .collect();
        locations.sort();

        let sorted: Vec<_> = locations.iter().map(|l| l.path_for_report()).collect();
        pretty_assertions::assert_eq!(sorted, vec!["[1]", "[2]", "[10]", "[1].name"]);
    }

    #[test]
    fn sort_many_deep_locations() {
        let mut locations: Vec<_> = (0..5_000)
            .map(|i| {
                FieldLocation::new((0..10).map(|depth| format!("f{}", (i * 7 + depth) % 13)))
            })
            .collect();

        let started = Instant::now();
        locations.sort();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(locations.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn display() {
        pretty_assertions::assert_eq!(FieldLocation::from_dotted("a.b.c").to_string(), "<a.b.c>");
        pretty_assertions::assert_eq!(FieldLocation::root().to_string(), "<>");
        pretty_assertions::assert_eq!(
            FieldLocation::from_dotted("children.[0].name").to_string(),
            "<children.name>"
        );
    }

    #[test]
    fn child_keeps_parent_intact() {
        let parent = FieldLocation::from_dotted("home.address");
        let child = parent.field("number");

        pretty_assertions::assert_eq!(parent.path_for_report(), "home.address");
        pretty_assertions::assert_eq!(child.path_for_report(), "home.address.number");
        pretty_assertions::assert_eq!(child.field_name(), "number");
        pretty_assertions::assert_eq!(child, FieldLocation::new(["home", "address", "number"]));
        assert!(child.has_parent(&parent));
        assert!(parent.has_child(&child));
        assert!(!child.has_child(&parent));
        assert!(!parent.has_child(&parent));
    }

    #[test]
    fn element_segment() {
        let location = FieldLocation::from_dotted("children").element(2).field("name");
        pretty_assertions::assert_eq!(location.path_for_report(), "children.[2].name");
        pretty_assertions::assert_eq!(location.rule_path(), "children.name");
        assert!(location.exactly_matches("children.name"));
        assert!(!location.exactly_matches("children"));
    }

    #[test]
    fn hierarchy_matches_regex() -> eyre::Result<()> {
        let regex = Regex::new("^(?:home\\..*s)$")?;
        assert!(FieldLocation::from_dotted("home.address.number").hierarchy_matches_regex(&regex));
        assert!(!FieldLocation::from_dotted("home.number").hierarchy_matches_regex(&regex));
        assert!(!FieldLocation::from_dotted("work.address").hierarchy_matches_regex(&regex));
        Ok(())
    }

    #[test]
    fn drop_very_deep_location() {
        let mut location = FieldLocation::root();
        for _ in 0..200_000 {
            location = location.field("next");
        }
        pretty_assertions::assert_eq!(location.depth(), 200_000);
        drop(location);
    }
}
