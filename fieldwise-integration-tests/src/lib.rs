//! End-to-end tests: types deriving `Introspect` checked through the fluent
//! assertions and the assertion macros.
pub mod model;

#[cfg(test)]
mod collections;
#[cfg(test)]
mod cycles;
#[cfg(test)]
mod defaults;
#[cfg(test)]
mod macros;
#[cfg(test)]
mod people;
