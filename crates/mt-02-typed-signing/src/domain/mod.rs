//! # Domain Layer
//!
//! Pure signing logic with no I/O dependencies.

pub mod ecdsa;
pub mod entities;
pub mod errors;
pub mod messages;
pub mod typed_data;
