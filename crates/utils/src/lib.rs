//! Common utility for extended `std` types
//!
#![doc = include_str!("../readme.md")]

// Alias for the format! macro
pub use std::format as f;

// Modules
mod string_ext;
mod value_ext;

// Flatten
pub use string_ext::StringExt;
pub use value_ext::ValueExt;
