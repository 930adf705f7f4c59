//! # Ports Layer
//!
//! Interfaces through which other crates drive typed signing.

pub mod inbound;
