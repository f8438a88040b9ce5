//! # Fieldwise - Recursive Field-by-Field Assertions
//!
//! Fieldwise compares two values field by field, recursively, and reports every
//! difference it finds with the dotted path of the field that differs. The two
//! values do not need to share a type: a domain `Person` can be checked against
//! a `PersonDto` as long as their field names line up.
//!
//! ## Quick Start
//!
//! ```bash
//! cargo add --dev fieldwise
//! ```
//!
//! ```rust,ignore
//! use fieldwise::{assert_that, Introspect};
//!
//! #[derive(Debug, Introspect)]
//! struct Person {
//!     name: String,
//!     age: u32,
//!     home: Home,
//! }
//!
//! #[derive(Debug, Introspect)]
//! struct PersonDto {
//!     name: &'static str,
//!     age: u64,
//!     home: HomeDto,
//! }
//!
//! #[test]
//! fn person_matches_dto() -> eyre::Result<()> {
//!     assert_that(&person)
//!         .using_recursive_comparison()
//!         .ignoring_fields(["home.address.number"])
//!         .ignoring_collection_order()
//!         .is_equal_to(&dto)?;
//!     Ok(())
//! }
//! ```
//!
//! On failure the error lists every difference:
//!
//! ```text
//! Expecting actual:
//!   Person { name: "Sheldon", age: 30, .. }
//! to be equal to:
//!   PersonDto { name: "Sheldon", age: 31, .. }
//! when recursively comparing field by field, but found the following 1 difference:
//!
//! field/property 'age' differ:
//! - actual value  : 30
//! - expected value: 31
//! ```
//!
//! ## Key Features
//!
//! - **Derive-based introspection**: `#[derive(Introspect)]` with `skip` and `rename` options
//! - **Cross-type comparison**: compare values of different types by field name, or opt into strict type checking
//! - **Collections and maps**: positional or order-agnostic comparison, sorted and unsorted maps
//! - **Cycle safe**: self-referencing graphs terminate, deep chains don't overflow the stack
//! - **Configurable**: ignored fields, regexes and types, custom comparators and error messages
//! - **Non-panicking**: every assertion returns a `Result`, so failures propagate with `?`
//!
//! ## Assertion Macros
//!
//! ```rust,ignore
//! use fieldwise::{check_recursively_eq, check_recursively_ne};
//!
//! fn checks(person: &Person, dto: &PersonDto, other: &PersonDto) -> eyre::Result<()> {
//!     check_recursively_eq!(*person, *dto, "person {}", person.name);
//!     check_recursively_ne!(*person, *other);
//!     Ok(())
//! }
//! ```
//!
//! ## Defaults
//!
//! Process-wide defaults are read from `fieldwise.toml` (or the file named by
//! `FIELDWISE_CONFIG`) and `FIELDWISE_*` environment variables, see [`config`].

mod assert;

pub use assert::{assert_that, ObjectAssert, RecursiveComparisonAssert};

// Re-export procedural macros
pub use fieldwise_derive::Introspect;

// Re-export crates failed assertions are reported through
pub use eyre;
pub use pretty_assertions;

// Re-export core modules, `#[derive(Introspect)]` expands to `::fieldwise::introspection`
pub use fieldwise_core::{
    assertion, calculator, config, configuration, difference, error, introspection, location,
    report, state,
};

// Re-export key functionality
pub use fieldwise_core::{
    assertion::Error as AssertionError,
    calculator::{determine_differences, RecursiveComparisonDifferenceCalculator},
    check_recursively_eq, check_recursively_ne,
    config::{defaults, reset_defaults, set_defaults, Defaults},
    configuration::{Builder, RecursiveComparisonConfiguration, StrictTypeChecking},
    difference::{Difference, DifferenceKind},
    error::{Error, Result},
    introspection::IntrospectionStrategy,
    location::FieldLocation,
    report::{ComparisonReport, Representation, StandardRepresentation},
};

// The trait lives in the type namespace, the derive macro in the macro namespace.
pub use fieldwise_core::introspection::Introspect;
