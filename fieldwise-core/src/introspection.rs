//! # Introspection
//!
//! The recursive comparison never inspects values directly. Every value it
//! walks implements [`Introspect`], which exposes the value as a [`Node`]: a
//! scalar, a struct with named fields, an enum variant, a sequence, a map,
//! null, or a transparent reference to another value.
//!
//! Implementations are provided for the standard scalar types, strings,
//! `Option`, smart pointers, tuples and the standard collections (plus
//! `indexmap`). User types get one through `#[derive(Introspect)]`.
//!
//! How the fields of a struct are enumerated and named is decided by an
//! [`IntrospectionStrategy`].
//!
//! ```text
//! Option<Box<Person>> --Ref--> Box<Person> --Ref--> Person --Struct--> [name, home]
//!        None ------------------------------------------------> Null
//! ```

use indexmap::{IndexMap, IndexSet};
use std::{
    any::{Any, TypeId},
    borrow::Cow,
    cell::OnceCell,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque},
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
    sync::{Arc, OnceLock},
};

/// Runtime type identity paired with a readable name.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + Any>() -> TypeKey {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Upcasting helpers implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn type_key(&self) -> TypeKey;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }
}

/// A value the recursive comparison can walk.
pub trait Introspect: AsAny + fmt::Debug {
    /// Exposes the shape of this value.
    fn node(&self) -> Node<'_>;

    /// The type a field of this value was declared with. Differs from the runtime
    /// type only for wrappers such as `Option<T>`, which declare `T`.
    fn declared_type(&self) -> TypeKey {
        self.type_key()
    }

    /// `PartialEq` verdict against `other`, for types deriving `Introspect` with
    /// `#[introspect(partial_eq)]`. `None` when the type did not opt in or `other`
    /// is of another type.
    fn partial_eq(&self, other: &dyn Introspect) -> Option<bool> {
        let _ = other;
        None
    }
}

/// The introspected shape of a value.
pub enum Node<'a> {
    Null,
    /// A transparent wrapper (`Box`, `Rc`, `Some`...) around another value.
    Ref(&'a dyn Introspect),
    Scalar(Scalar<'a>),
    Struct(Vec<Field<'a>>),
    Variant(Variant<'a>),
    Sequence(Sequence<'a>),
    Map(MapNode<'a>),
}

impl Node<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// Human readable shape, used in difference descriptions.
    pub fn shape(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Ref(_) => "a reference",
            Node::Scalar(scalar) => scalar.kind(),
            Node::Struct(_) => "a struct",
            Node::Variant(_) => "an enum variant",
            Node::Sequence(sequence) => sequence.kind.description(),
            Node::Map(map) if map.sorted => "a sorted map",
            Node::Map(_) => "a map",
        }
    }
}

#[derive(Clone, Copy)]
pub struct Field<'a> {
    pub name: &'static str,
    pub value: &'a dyn Introspect,
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, value: &'a dyn Introspect) -> Field<'a> {
        Field { name, value }
    }
}

pub struct Variant<'a> {
    pub name: &'static str,
    pub fields: Vec<Field<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SequenceKind {
    #[strum(serialize = "array")]
    Array,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "ordered set")]
    OrderedSet,
    #[strum(serialize = "set")]
    Set,
}

impl SequenceKind {
    /// True when the position of an element is meaningful.
    pub fn is_ordered(&self) -> bool {
        !matches!(self, SequenceKind::Set)
    }

    pub fn description(&self) -> &'static str {
        match self {
            SequenceKind::Array => "an array",
            SequenceKind::List => "an ordered collection",
            SequenceKind::OrderedSet => "an ordered set",
            SequenceKind::Set => "an unordered collection",
        }
    }
}

pub struct Sequence<'a> {
    pub kind: SequenceKind,
    pub elements: Vec<&'a dyn Introspect>,
}

pub struct MapNode<'a> {
    /// Whether iteration order is the key order (`BTreeMap`).
    pub sorted: bool,
    pub entries: Vec<(&'a dyn Introspect, &'a dyn Introspect)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Bool(bool),
    Int(i128),
    UInt(u128),
    Float(f64),
    Char(char),
    Str(&'a str),
}

impl Scalar<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "a boolean",
            Scalar::Int(_) | Scalar::UInt(_) => "an integer",
            Scalar::Float(_) => "a float",
            Scalar::Char(_) => "a char",
            Scalar::Str(_) => "a string",
        }
    }

    /// Compares two scalars by value. Numbers compare across widths and signedness,
    /// `NaN` equals `NaN`. Returns `None` when the kinds cannot be compared.
    pub fn value_eq(&self, other: &Scalar<'_>) -> Option<bool> {
        use Scalar::*;

        match (self, other) {
            (Bool(a), Bool(b)) => Some(a == b),
            (Char(a), Char(b)) => Some(a == b),
            (Str(a), Str(b)) => Some(a == b),
            (Int(a), Int(b)) => Some(a == b),
            (UInt(a), UInt(b)) => Some(a == b),
            (Int(i), UInt(u)) | (UInt(u), Int(i)) => {
                Some(u128::try_from(*i).is_ok_and(|i| i == *u))
            }
            (Float(a), Float(b)) => Some(a == b || (a.is_nan() && b.is_nan())),
            (Float(f), Int(i)) | (Int(i), Float(f)) => {
                Some(integral(*f, 127).is_some_and(|f| f as i128 == *i))
            }
            (Float(f), UInt(u)) | (UInt(u), Float(f)) => {
                Some(integral(*f, 128).is_some_and(|f| f >= 0.0 && f as u128 == *u))
            }
            _ => None,
        }
    }
}

/// `value` when it is a whole number of magnitude below `2^bits`, so that the
/// cast to a 128-bit integer is exact.
fn integral(value: f64, bits: i32) -> Option<f64> {
    let bound = 2f64.powi(bits);
    (value.fract() == 0.0 && value >= -bound && value < bound).then_some(value)
}

impl fmt::Display for Scalar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::UInt(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Char(v) => write!(f, "{v}"),
            Scalar::Str(v) => f.write_str(v),
        }
    }
}

/// Follows [`Node::Ref`] links until a value with a concrete shape is reached.
pub fn resolve(mut value: &dyn Introspect) -> (&dyn Introspect, Node<'_>) {
    loop {
        match value.node() {
            Node::Ref(inner) => value = inner,
            node => return (value, node),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntrospectionError {
    #[error("fields \"{first}\" and \"{second}\" of {owner} are both read as \"{normalized}\"")]
    AmbiguousField {
        owner: String,
        first: String,
        second: String,
        normalized: String,
    },
    #[error("{owner} has no field \"{field}\" to compare")]
    UnknownField { owner: String, field: String },
}

/// A named child value, as seen by an [`IntrospectionStrategy`].
#[derive(Clone)]
pub struct Child<'a> {
    pub name: Cow<'static, str>,
    pub value: &'a dyn Introspect,
}

/// Decides how the fields of a struct or variant are enumerated and named.
pub trait IntrospectionStrategy: Send + Sync + fmt::Debug {
    fn children<'a>(
        &self,
        owner: TypeKey,
        fields: &[Field<'a>],
    ) -> Result<Vec<Child<'a>>, IntrospectionError>;

    /// Sentence used in the configuration description.
    fn description(&self) -> String;
}

/// Reads every declared field under its declared name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldByField;

impl IntrospectionStrategy for FieldByField {
    fn children<'a>(
        &self,
        _owner: TypeKey,
        fields: &[Field<'a>],
    ) -> Result<Vec<Child<'a>>, IntrospectionError> {
        Ok(fields
            .iter()
            .map(|field| Child {
                name: Cow::Borrowed(field.name),
                value: field.value,
            })
            .collect())
    }

    fn description(&self) -> String {
        "comparing fields".to_string()
    }
}

/// Reads fields under a normalized name (lowercase, underscores removed) so that
/// `first_name` and `firstName` designate the same field.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedFieldNames;

impl NormalizedFieldNames {
    pub fn normalize(name: &str) -> String {
        name.chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect()
    }
}

impl IntrospectionStrategy for NormalizedFieldNames {
    fn children<'a>(
        &self,
        owner: TypeKey,
        fields: &[Field<'a>],
    ) -> Result<Vec<Child<'a>>, IntrospectionError> {
        let mut seen: HashMap<String, &'static str> = HashMap::new();
        let mut children = Vec::with_capacity(fields.len());
        for field in fields {
            let normalized = Self::normalize(field.name);
            if let Some(first) = seen.insert(normalized.clone(), field.name) {
                return Err(IntrospectionError::AmbiguousField {
                    owner: owner.to_string(),
                    first: first.to_string(),
                    second: field.name.to_string(),
                    normalized,
                });
            }
            children.push(Child {
                name: Cow::Owned(normalized),
                value: field.value,
            });
        }
        Ok(children)
    }

    fn description(&self) -> String {
        "comparing fields with normalized names (lowercase, underscores ignored)".to_string()
    }
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {
        $(impl Introspect for $ty {
            fn node(&self) -> Node<'_> {
                Node::Scalar(Scalar::Int(*self as i128))
            }
        })*
    };
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {
        $(impl Introspect for $ty {
            fn node(&self) -> Node<'_> {
                Node::Scalar(Scalar::UInt(*self as u128))
            }
        })*
    };
}

impl_signed!(i8, i16, i32, i64, i128, isize);
impl_unsigned!(u8, u16, u32, u64, u128, usize);

impl Introspect for f32 {
    fn node(&self) -> Node<'_> {
        Node::Scalar(Scalar::Float(f64::from(*self)))
    }
}

impl Introspect for f64 {
    fn node(&self) -> Node<'_> {
        Node::Scalar(Scalar::Float(*self))
    }
}

impl Introspect for bool {
    fn node(&self) -> Node<'_> {
        Node::Scalar(Scalar::Bool(*self))
    }
}

impl Introspect for char {
    fn node(&self) -> Node<'_> {
        Node::Scalar(Scalar::Char(*self))
    }
}

impl Introspect for String {
    fn node(&self) -> Node<'_> {
        Node::Scalar(Scalar::Str(self))
    }
}

impl Introspect for &'static str {
    fn node(&self) -> Node<'_> {
        Node::Scalar(Scalar::Str(self))
    }
}

impl Introspect for Cow<'static, str> {
    fn node(&self) -> Node<'_> {
        Node::Scalar(Scalar::Str(self))
    }
}

impl Introspect for () {
    fn node(&self) -> Node<'_> {
        Node::Struct(Vec::new())
    }
}

impl<T: Introspect> Introspect for Option<T> {
    fn node(&self) -> Node<'_> {
        match self {
            Some(value) => Node::Ref(value),
            None => Node::Null,
        }
    }

    fn declared_type(&self) -> TypeKey {
        TypeKey::of::<T>()
    }
}

macro_rules! impl_pointer {
    ($($ptr:ident),*) => {
        $(
            impl<T: Introspect> Introspect for $ptr<T> {
                fn node(&self) -> Node<'_> {
                    Node::Ref(&**self)
                }
            }

            impl Introspect for $ptr<dyn Introspect> {
                fn node(&self) -> Node<'_> {
                    Node::Ref(&**self)
                }
            }
        )*
    };
}

impl_pointer!(Box, Rc, Arc);

impl<T: Introspect> Introspect for OnceCell<T> {
    fn node(&self) -> Node<'_> {
        match self.get() {
            Some(value) => Node::Ref(value),
            None => Node::Null,
        }
    }
}

impl<T: Introspect> Introspect for OnceLock<T> {
    fn node(&self) -> Node<'_> {
        match self.get() {
            Some(value) => Node::Ref(value),
            None => Node::Null,
        }
    }
}

fn sequence<'a, T: Introspect>(
    kind: SequenceKind,
    elements: impl Iterator<Item = &'a T>,
) -> Node<'a> {
    Node::Sequence(Sequence {
        kind,
        elements: elements.map(|e| e as &dyn Introspect).collect(),
    })
}

impl<T: Introspect> Introspect for Vec<T> {
    fn node(&self) -> Node<'_> {
        sequence(SequenceKind::List, self.iter())
    }
}

impl<T: Introspect> Introspect for VecDeque<T> {
    fn node(&self) -> Node<'_> {
        sequence(SequenceKind::List, self.iter())
    }
}

impl<T: Introspect> Introspect for LinkedList<T> {
    fn node(&self) -> Node<'_> {
        sequence(SequenceKind::List, self.iter())
    }
}

impl<T: Introspect, const N: usize> Introspect for [T; N] {
    fn node(&self) -> Node<'_> {
        sequence(SequenceKind::Array, self.iter())
    }
}

impl<T: Introspect> Introspect for BTreeSet<T> {
    fn node(&self) -> Node<'_> {
        sequence(SequenceKind::OrderedSet, self.iter())
    }
}

impl<T: Introspect, S: 'static> Introspect for IndexSet<T, S> {
    fn node(&self) -> Node<'_> {
        sequence(SequenceKind::OrderedSet, self.iter())
    }
}

impl<T: Introspect, S: 'static> Introspect for HashSet<T, S> {
    fn node(&self) -> Node<'_> {
        sequence(SequenceKind::Set, self.iter())
    }
}

fn map<'a, K: Introspect, V: Introspect>(
    sorted: bool,
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> Node<'a> {
    Node::Map(MapNode {
        sorted,
        entries: entries
            .map(|(k, v)| (k as &dyn Introspect, v as &dyn Introspect))
            .collect(),
    })
}

impl<K: Introspect, V: Introspect> Introspect for BTreeMap<K, V> {
    fn node(&self) -> Node<'_> {
        map(true, self.iter())
    }
}

impl<K: Introspect, V: Introspect, S: 'static> Introspect for HashMap<K, V, S> {
    fn node(&self) -> Node<'_> {
        map(false, self.iter())
    }
}

impl<K: Introspect, V: Introspect, S: 'static> Introspect for IndexMap<K, V, S> {
    fn node(&self) -> Node<'_> {
        map(false, self.iter())
    }
}

macro_rules! impl_tuple {
    ($(($($name:ident : $idx:tt),+)),*) => {
        $(impl<$($name: Introspect),+> Introspect for ($($name,)+) {
            fn node(&self) -> Node<'_> {
                Node::Struct(vec![$(Field::new(stringify!($idx), &self.$idx)),+])
            }
        })*
    };
}

impl_tuple!(
    (A: 0),
    (A: 0, B: 1),
    (A: 0, B: 1, C: 2),
    (A: 0, B: 1, C: 2, D: 3),
    (A: 0, B: 1, C: 2, D: 3, E: 4),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5)
);

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case(Scalar::Int(1), Scalar::UInt(1) => Some(true); "signed and unsigned")]
    #[test_case(Scalar::Int(-1), Scalar::UInt(u128::MAX) => Some(false); "negative never equals unsigned")]
    #[test_case(Scalar::Float(f64::NAN), Scalar::Float(f64::NAN) => Some(true); "nan")]
    #[test_case(Scalar::Float(2.0), Scalar::Int(2) => Some(true); "float and integer")]
    #[test_case(Scalar::Float(2.5), Scalar::UInt(2) => Some(false); "fractional float")]
    #[test_case(Scalar::Float(9_007_199_254_740_992.0), Scalar::Int(9_007_199_254_740_993) => Some(false); "integer above float precision")]
    #[test_case(Scalar::UInt(u64::MAX as u128), Scalar::Float(18_446_744_073_709_551_616.0) => Some(false); "rounded unsigned")]
    #[test_case(Scalar::Float(-4.0), Scalar::UInt(4) => Some(false); "negative float and unsigned")]
    #[test_case(Scalar::Float(f64::INFINITY), Scalar::Int(i128::MAX) => Some(false); "infinity")]
    #[test_case(Scalar::Str("a"), Scalar::Char('a') => None; "string and char")]
    #[test_case(Scalar::Bool(true), Scalar::Int(1) => None; "bool and integer")]
    fn scalar_value_eq(left: Scalar<'static>, right: Scalar<'static>) -> Option<bool> {
        left.value_eq(&right)
    }

    #[test]
    fn resolve_follows_wrappers() {
        let value: Option<Box<Rc<u8>>> = Some(Box::new(Rc::new(7)));
        let (resolved, node) = resolve(&value);

        pretty_assertions::assert_eq!(resolved.type_key(), TypeKey::of::<u8>());
        assert!(matches!(node, Node::Scalar(Scalar::UInt(7))));
    }

    #[test]
    fn none_is_null_and_declares_inner_type() {
        let value: Option<String> = None;
        let (resolved, node) = resolve(&value);

        assert!(node.is_null());
        pretty_assertions::assert_eq!(resolved.type_key(), TypeKey::of::<Option<String>>());
        pretty_assertions::assert_eq!(value.declared_type(), TypeKey::of::<String>());
    }

    #[test]
    fn collections_have_kinds() {
        let kind = |value: &dyn Introspect| match value.node() {
            Node::Sequence(sequence) => Some(sequence.kind),
            _ => None,
        };

        pretty_assertions::assert_eq!(kind(&vec![1]), Some(SequenceKind::List));
        pretty_assertions::assert_eq!(kind(&[1, 2]), Some(SequenceKind::Array));
        pretty_assertions::assert_eq!(kind(&BTreeSet::from([1])), Some(SequenceKind::OrderedSet));
        pretty_assertions::assert_eq!(kind(&HashSet::from([1])), Some(SequenceKind::Set));
        pretty_assertions::assert_eq!(kind(&"text"), None);
    }

    #[test]
    fn tuple_fields_are_positional() {
        let value = (1u8, "two");
        let Node::Struct(fields) = value.node() else {
            panic!("tuple should be a struct");
        };
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        pretty_assertions::assert_eq!(names, vec!["0", "1"]);
    }

    #[test]
    fn normalized_field_names() -> eyre::Result<()> {
        let (a, b) = (1u8, 2u8);
        let fields = [Field::new("first_name", &a), Field::new("Age", &b)];
        let children = NormalizedFieldNames.children(TypeKey::of::<()>(), &fields)?;

        let names: Vec<_> = children.iter().map(|c| c.name.as_ref()).collect();
        pretty_assertions::assert_eq!(names, vec!["firstname", "age"]);
        Ok(())
    }

    #[test]
    fn normalized_field_names_reject_collisions() {
        let (a, b) = (1u8, 2u8);
        let fields = [Field::new("first_name", &a), Field::new("firstName", &b)];
        let result = NormalizedFieldNames.children(TypeKey::of::<()>(), &fields);

        assert!(matches!(
            result,
            Err(IntrospectionError::AmbiguousField { ref normalized, .. }) if normalized == "firstname"
        ));
    }
}
