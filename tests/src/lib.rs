//! # Meta-Transaction Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Digest, recovery and log-decode throughput
//! └── src/
//!     ├── harness.rs    # Wired runtime, signers, simulated relayer
//!     └── integration/  # Cross-crate flows over the shared bus
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mt-tests
//! cargo bench -p mt-tests
//! ```

pub mod harness;
pub mod integration;
