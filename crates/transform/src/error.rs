//! Result and Error types for egstools-transform

/// Type alias for Result<T, transform::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `egstools-transform` crate
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("no rotation can be constructed from a zero vector")]
    ZeroVector,

    #[error("expected {expected} values for the {name}, found {found}")]
    UnexpectedLength {
        name: &'static str,
        expected: &'static str,
        found: usize,
    },
}
