use std::sync::Arc;

use thiserror::Error;

use crate::{
    token::{Qualifier, Token},
    types::DynError,
};

pub const NO_BEAN_DEFINITION: &str = "NO_BEAN_DEFINITION";
pub const DUPLICATE_FACTORY: &str = "DUPLICATE_FACTORY";
pub const UNDECIDABLE_BEAN: &str = "UNDECIDABLE_BEAN";
pub const EMPTY_VALUE: &str = "EMPTY_VALUE";
pub const FACTORY_FAILED: &str = "FACTORY_FAILED";
pub const DOWNCAST_FAILED: &str = "DOWNCAST_FAILED";
pub const DEFERRED: &str = "DEFERRED";

/// Errors when providing or injecting a bean
///
/// Cloneable, so the same error can reject every listener of a deferred bean.
#[derive(Error, Debug, Clone)]
pub enum InjectError {
    /// Nothing is bound anywhere up the chain, and the token can't be constructed
    #[error("No bean definition for '{token}' with qualifier '{qualifier}'")]
    NoBeanDefinition { token: Token, qualifier: Qualifier },
    /// The slot is already taken in this registry
    #[error("'{token}' is already bound with qualifier '{qualifier}' in this registry")]
    DuplicateFactory { token: Token, qualifier: Qualifier },
    /// Several bindings match the default qualifier at one level
    #[error("'{token}' is bound under {qualifiers:?} - ask for one of them by qualifier")]
    UndecidableBean {
        token: Token,
        qualifiers: Vec<Qualifier>,
    },
    /// The bound value is absent
    #[error("'{token}' with qualifier '{qualifier}' resolved to an empty value")]
    EmptyValue { token: Token, qualifier: Qualifier },
    /// A factory returned an error
    #[error("Factory for '{token}' failed - error: {error:?}")]
    FactoryFailed { token: Token, error: Arc<DynError> },

    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
    /// The bean only exists as a promise so far
    #[error("'{required_type}' is deferred - resolve it as a promise instead")]
    Deferred { required_type: &'static str },
}

impl InjectError {
    /// Stable name to switch on
    pub fn name(&self) -> &'static str {
        match self {
            InjectError::NoBeanDefinition { .. } => NO_BEAN_DEFINITION,
            InjectError::DuplicateFactory { .. } => DUPLICATE_FACTORY,
            InjectError::UndecidableBean { .. } => UNDECIDABLE_BEAN,
            InjectError::EmptyValue { .. } => EMPTY_VALUE,
            InjectError::FactoryFailed { .. } => FACTORY_FAILED,
            InjectError::DowncastFailed { .. } => DOWNCAST_FAILED,
            InjectError::Deferred { .. } => DEFERRED,
        }
    }
}

/// Errors when reading a [RegistryConfig](crate::config::RegistryConfig)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for '{key}', expected a boolean")]
    Invalid { key: &'static str, value: String },
}
