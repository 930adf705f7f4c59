//! # Domain Layer
//!
//! Pure encoding logic with no I/O dependencies.

pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod errors;
pub mod hashing;
pub mod types;
pub mod value;

/// Size of one ABI word in bytes.
pub const WORD: usize = 32;
