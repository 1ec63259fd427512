//! Result and Error types for egstools-scoring

/// Type alias for Result<T, scoring::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `egstools-scoring` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("scoring arrays need at least one bin")]
    EmptyArray,

    #[error("unexpected end of state data while reading {0}")]
    EndOfState(&'static str),

    #[error("failed to parse {expected} from \"{found}\"")]
    ParseError {
        expected: &'static str,
        found: String,
    },

    #[error("inconsistent state data: {0}")]
    InconsistentState(String),
}
