//! Result and Error types for egstools-ausgab

/// Type alias for Result<T, ausgab::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `egstools-ausgab` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    ScoringError(#[from] egstools_scoring::Error),

    #[error("{0} is not a valid ausgab call")]
    UnknownCall(i32),

    #[error("unable to infer a particle charge from \"{0}\"")]
    UnknownCharge(String),
}
