use crate::errors::ConfigError;

/// Environment variable switching factory evaluation to lazy
pub const LAZY_ENV: &str = "STRATA_DI_LAZY";
/// Environment variable switching value validation to lazy
pub const LAZY_VALIDATION_ENV: &str = "STRATA_DI_LAZY_VALIDATION";

/// Configuration of one registry node, fixed when the node is created.
///
/// The default is eager on both axes: factories run as soon as they are provided,
/// and values are checked for emptiness right there.
///
/// # Example
/// ```rust
/// use strata_di::{Registry, RegistryConfig};
///
/// let registry = Registry::with_config(RegistryConfig::default().lazy(true));
/// assert!(registry.config().lazy);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Defer factories until the first injection
    pub lazy: bool,
    /// Defer emptiness checks until the first injection
    pub lazy_validation: bool,
}

impl RegistryConfig {
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn lazy_validation(mut self, lazy_validation: bool) -> Self {
        self.lazy_validation = lazy_validation;
        self
    }

    /// Reads [LAZY_ENV] and [LAZY_VALIDATION_ENV], unset variables keep the default
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [RegistryConfig::from_env], with a custom source for the variables
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(LAZY_ENV) {
            config.lazy = parse_flag(LAZY_ENV, &value)?;
        }
        if let Some(value) = lookup(LAZY_VALIDATION_ENV) {
            config.lazy_validation = parse_flag(LAZY_VALIDATION_ENV, &value)?;
        }
        Ok(config)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}
