//! `egstools` is a modular toolkit of fluence and kerma scoring objects for
//! coupled photon/electron Monte Carlo transport
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use egstools_ausgab as ausgab;

#[doc(inline)]
pub use egstools_interp as interp;

#[doc(inline)]
pub use egstools_scoring as scoring;

#[doc(inline)]
pub use egstools_transform as transform;

#[doc(inline)]
pub use egstools_utils as utils;

#[cfg(feature = "fluence")]
#[cfg_attr(docsrs, doc(cfg(feature = "fluence")))]
#[doc(inline)]
pub use egstools_fluence as fluence;

#[cfg(feature = "kerma")]
#[cfg_attr(docsrs, doc(cfg(feature = "kerma")))]
#[doc(inline)]
pub use egstools_kerma as kerma;
