//! Command implementations for userctl CLI

pub mod serve;

pub use serve::run_serve;
