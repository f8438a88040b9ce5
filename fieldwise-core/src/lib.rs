//! # Fieldwise Core
//!
//! Core functionality for the fieldwise recursive comparison library.
//!
//! This crate provides the building blocks of fieldwise, including:
//! - Value introspection (`Introspect`) and field locations
//! - The recursive comparison configuration and its builder
//! - The difference calculator and failure reports
//! - Assertion macros and process-wide defaults
//!
//! ## Architecture (block diagram)
//!
//! ```text
//! +---------------------+      +---------------------+      +---------------------+
//! | #[derive(Introspect)]| --> | difference          | ---> | report (output)     |
//! | + std impls         |      | calculator          |      | ComparisonReport    |
//! +---------------------+      +---------------------+      +---------------------+
//!                                 ^       |      ^
//!                                 |       v      |
//! +---------------------+         |  +---------------------+
//! | configuration       | --------+  | work stack +        |
//! | Builder, rules      |            | visited pairs       |
//! +---------------------+            +---------------------+
//!            ^
//!            |
//! +---------------------+      +---------------------+
//! | config (defaults)   | <--- | fieldwise.toml      |
//! | FIELDWISE_* env     |      | + env overrides     |
//! +---------------------+      +---------------------+
//! ```
//!
//! Most users should use the main `fieldwise` crate rather than importing `fieldwise-core` directly.

pub mod assertion;
pub mod calculator;
mod collections;
pub mod config;
pub mod configuration;
pub mod difference;
pub mod error;
pub mod introspection;
pub mod location;
pub mod report;
pub mod state;

// Re-export procedural macros
pub use fieldwise_derive::Introspect;

// Re-export key functionality
pub use calculator::{determine_differences, RecursiveComparisonDifferenceCalculator};
pub use config::{defaults, reset_defaults, set_defaults, Defaults};
pub use configuration::{Builder, RecursiveComparisonConfiguration, StrictTypeChecking};
pub use difference::{Difference, DifferenceKind};
pub use error::{Error, Result};
pub use introspection::{Introspect, IntrospectionStrategy};
pub use location::FieldLocation;
pub use report::{ComparisonReport, Representation, StandardRepresentation};
