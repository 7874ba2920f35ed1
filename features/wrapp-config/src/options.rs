use crate::{
    config::{ResolverConfig, ValidationLevel},
    errors::ConfigError,
};

pub const PARALLEL: &str = "wrapp.parallel";
pub const SCOPE_VALIDATION: &str = "wrapp.scopeValidation";
pub const REPEATED_SCOPE_VALIDATION: &str = "wrapp.repeatedScopeValidation";

impl ResolverConfig {
    /// Reads a config from processor style options.
    ///
    /// Options not given keep their default. Unknown keys or values which can't be parsed
    /// will return a [`ConfigError`]
    pub fn from_options<K, V>(
        options: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, ConfigError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = ResolverConfig::default();
        for (key, value) in options {
            config.apply_option(key.as_ref(), value.as_ref())?;
        }
        Ok(config)
    }

    /// Applies a single option on top of the current config.
    pub fn apply_option(&mut self, key: &str, value: &str) -> Result<&mut Self, ConfigError> {
        match key {
            PARALLEL => self.parallel = parse_bool(key, value)?,
            SCOPE_VALIDATION => self.scope_validation = parse_level(key, value)?,
            REPEATED_SCOPE_VALIDATION => self.repeated_scope_validation = parse_level(key, value)?,
            unknown => return Err(ConfigError::UnknownOption(unknown.to_string())),
        }
        Ok(self)
    }
}

fn parse_bool(option: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "true" | "enabled" => Ok(true),
        "false" | "disabled" => Ok(false),
        _ => Err(invalid(option, value, "true or false")),
    }
}

fn parse_level(option: &str, value: &str) -> Result<ValidationLevel, ConfigError> {
    value
        .parse()
        .map_err(|_| invalid(option, value, "error, warning or none"))
}

fn invalid(option: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        expected,
    }
}
