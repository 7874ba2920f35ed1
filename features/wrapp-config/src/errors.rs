/// Errors when reading resolver options
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The option key is not known
    #[error("Unknown resolver option '{0}'")]
    UnknownOption(String),
    /// The option value could not be parsed
    #[error("Invalid value '{value}' for option '{option}', expected {expected}")]
    InvalidValue {
        option: String,
        value: String,
        expected: &'static str,
    },
}
