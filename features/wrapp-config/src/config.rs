use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// How a class of problems found during resolution is reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Reported as a diagnostic, failing the resolution
    #[default]
    Error,
    /// Logged as a warning, resolution continues
    Warning,
    /// Not checked at all
    None,
}
impl ValidationLevel {
    /// Returns true if the check runs at all
    pub fn is_enabled(self) -> bool {
        self != ValidationLevel::None
    }

    pub fn is_error(self) -> bool {
        self == ValidationLevel::Error
    }
}
impl FromStr for ValidationLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(ValidationLevel::Error),
            "warning" => Ok(ValidationLevel::Warning),
            "none" => Ok(ValidationLevel::None),
            _ => Err(()),
        }
    }
}
impl Display for ValidationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ValidationLevel::Error => "error",
            ValidationLevel::Warning => "warning",
            ValidationLevel::None => "none",
        })
    }
}

/// Configuration of the binding graph resolver.
///
/// Can be deserialized (all fields are optional and fall back to [ResolverConfig::default]),
/// built with the `with_*` setters or read from processor options,
/// see [ResolverConfig::from_options].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Resolve independent components on the thread pool
    pub parallel: bool,
    /// How bindings used outside of their scope are reported
    pub scope_validation: ValidationLevel,
    /// How subcomponents repeating an ancestor scope are reported
    pub repeated_scope_validation: ValidationLevel,
}
impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            scope_validation: ValidationLevel::Error,
            repeated_scope_validation: ValidationLevel::Error,
        }
    }
}

impl ResolverConfig {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_scope_validation(mut self, level: ValidationLevel) -> Self {
        self.scope_validation = level;
        self
    }

    pub fn with_repeated_scope_validation(mut self, level: ValidationLevel) -> Self {
        self.repeated_scope_validation = level;
        self
    }
}
