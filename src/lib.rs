//! flowgen - packet classification rule translator
//!
//! Reads classifier rule lists in several notations, normalizes them into
//! one ordered rule set and renders it for packet-processing backends:
//! NIC flow APIs, flow directors, SDN controllers and software switches.
//!
//! # Architecture
//!
//! - [`core`] - Rule model, parser, generator and backend emitters
//! - [`validators`] - Configuration value checks
//! - [`config`] - Layered configuration loading
//! - [`utils`] - Utility functions (XDG directories, artifact names)
//!
//! # Example
//!
//! ```
//! use flowgen::config::TranslatorConfig;
//! use flowgen::core::emit::Backend;
//! use flowgen::core::pipeline::translate_source;
//!
//! let config = TranslatorConfig::default();
//! let translation = translate_source(
//!     "acl",
//!     "allow src host 10.0.0.5\ndrop dst net 192.168.1.0/24",
//!     Backend::FlowApi,
//!     &config,
//! )
//! .unwrap();
//! assert_eq!(translation.rule_set.len(), 2);
//! assert_eq!(translation.artifacts.len(), 1);
//! ```

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod core;
pub mod utils;
pub mod validators;

// Re-export commonly used types
pub use core::emit::Backend;
pub use core::error::{Error, Result};
pub use core::rule::{CanonicalRule, RuleSet};
