//! Core rule translation functionality
//!
//! This module contains the rule model and everything between a source file
//! and the artifacts written for a backend:
//!
//! - [`address`]: IPv4 and MAC address types
//! - [`lexer`] / [`parser`]: source lines to rule drafts
//! - [`rule`]: canonical rules and ordered rule sets
//! - [`generator`]: seeded synthetic rule sets
//! - [`queue`] / [`chain`]: queue striping and group/table jump rules
//! - [`emit`]: one emitter per target backend
//! - [`artifact`]: rendered output and atomic writes
//! - [`pipeline`]: end-to-end translation
//! - [`error`]: error and skip types

pub mod address;
pub mod artifact;
pub mod chain;
pub mod emit;
pub mod error;
pub mod generator;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod queue;
pub mod rule;

#[cfg(test)]
pub mod test_helpers;

#[cfg(test)]
mod tests;
