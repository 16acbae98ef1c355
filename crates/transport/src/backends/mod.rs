//! Transport backend implementations.

pub mod filesystem;
