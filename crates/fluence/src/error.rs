//! Result and Error types for egstools-fluence

// egstools modules
use egstools_ausgab::Charge;

/// Type alias for Result<T, fluence::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `egstools-fluence` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    AusgabError(#[from] egstools_ausgab::Error),

    #[error(transparent)]
    InterpError(#[from] egstools_interp::Error),

    #[error(transparent)]
    ScoringError(#[from] egstools_scoring::Error),

    #[error(transparent)]
    TransformError(#[from] egstools_transform::Error),

    #[error("no scoring particle defined, expected one of electron, photon or positron")]
    UndefinedScoringParticle,

    #[error("decreasing region group {start}-{stop} in \"{what}\"")]
    DecreasingRegionGroup {
        what: &'static str,
        start: i64,
        stop: i64,
    },

    #[error("mismatched start ({start}) and stop ({stop}) region groups in \"{what}\"")]
    MismatchedRegionGroups {
        what: &'static str,
        start: usize,
        stop: usize,
    },

    #[error("range rejection cannot be combined with the {0} method")]
    RangeRejection(crate::config::Method),

    #[error("no {charge} stopping power available for medium {medium}")]
    MissingStoppingPower { medium: usize, charge: Charge },
}
