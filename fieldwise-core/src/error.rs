use crate::introspection::IntrospectionError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Occurs when a recursive comparison configuration is invalid, e.g. a regex does not compile.
    #[error("invalid recursive comparison configuration: {0}")]
    Configuration(String),
    /// Occurs when the introspection strategy fails to read a value.
    #[error("cannot introspect value: {0}")]
    Introspection(#[from] IntrospectionError),
    /// Occurs when `fieldwise.toml` fails to load.
    #[error("failed to load fieldwise.toml: {0}")]
    LoadError(String),
}
