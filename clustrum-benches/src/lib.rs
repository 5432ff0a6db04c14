//! Benchmark support crate for clustrum.
//!
//! Provides seeded synthetic labelled assignments and parameter types used
//! by the Criterion validation benchmarks.

pub mod error;
pub mod params;
pub mod synthetic;
