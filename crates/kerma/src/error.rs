//! Result and Error types for egstools-kerma

/// Type alias for Result<T, kerma::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `egstools-kerma` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    AusgabError(#[from] egstools_ausgab::Error),

    #[error(transparent)]
    FluenceError(#[from] egstools_fluence::Error),

    #[error(transparent)]
    InterpError(#[from] egstools_interp::Error),

    #[error(transparent)]
    ScoringError(#[from] egstools_scoring::Error),

    #[error(transparent)]
    TransformError(#[from] egstools_transform::Error),

    #[error("no \"emuen file\" given for the kerma calculation")]
    MissingEmuenFile,

    #[error("failed to open emuen file \"{path}\"")]
    UnreadableEmuenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read emuen data: {0}")]
    MalformedEmuen(String),

    #[error("emuen data needs at least 2 entries, found {0}")]
    TooFewEmuenEntries(usize),

    #[error("excluded region {region} of \"{geometry}\" outside the allowed range 0...{max}")]
    ExcludedRegionOutOfRange {
        geometry: String,
        region: i64,
        max: usize,
    },

    #[error("missing or wrong \"scoring region masses\" or \"scoring volume mass\" for \"{0}\"")]
    MissingMass(String),

    #[error("{masses} masses given for {regions} scoring regions of \"{geometry}\", expected one per region or a single total")]
    MassMismatch {
        geometry: String,
        masses: usize,
        regions: usize,
    },

    #[error("no calculation geometries defined")]
    NoCalculationGeometry,
}
