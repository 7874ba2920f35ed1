//! Wrapp Config holds the knobs of the binding graph resolver.
//!
//! Wrapp Config is split into two major parts:
//! 1. ResolverConfig: The typed configuration handed to the resolver
//! 2. Options: Parsing of processor style `key=value` options into a [ResolverConfig]
//!
//! # Examples
//!
//! ```rust
//! use wrapp_config::{ResolverConfig, ValidationLevel};
//!
//! let config = ResolverConfig::from_options([
//!     ("wrapp.parallel", "false"),
//!     ("wrapp.scopeValidation", "warning"),
//! ])
//! .unwrap();
//!
//! assert!(!config.parallel);
//! assert_eq!(config.scope_validation, ValidationLevel::Warning);
//! ```
//!
//! Wrapp Config consists of the following components:
//!
//! 1. Config - the resolver configuration and its validation levels
//! 2. Options - for reading processor options
//! 3. Errors - for config errors

pub mod config;
pub mod errors;
pub mod options;

pub use config::{ResolverConfig, ValidationLevel};
pub use errors::ConfigError;
