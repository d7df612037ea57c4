//! Genome data model
//!
//! A genome is an already-parsed, position-sorted sequence of [`Base`]s.
//! Reading genomes from disk is left to callers; [`synthetic`] generates
//! datasets for experiments and tests.

mod base;
pub mod synthetic;

pub use base::{ensure_strictly_increasing, Base, SENTINEL_SYMBOL};
