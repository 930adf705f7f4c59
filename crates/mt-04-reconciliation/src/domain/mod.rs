//! # Domain Layer
//!
//! Requests, outcomes, registry events and the status state machine.
//! Pure, no I/O.

pub mod entities;
pub mod errors;
pub mod events;
pub mod transitions;
