//! Strata DI is a hierarchical registry of beans.
//!
//! Values and factories are bound to a [Token] under one or more [Qualifier]s.
//! Registries form a tree: a lookup that finds nothing locally asks the parents,
//! the most recently added one first. Factory results are cached where they were
//! requested, and values still on their way are handed out as [BeanPromise]s
//! which settle in the context of the registry that owns the binding.
//!
//! # Examples
//!
//! ```rust
//! use strata_di::{Definition, InjectError, Registry};
//!
//! # fn main() -> Result<(), InjectError> {
//! let root = Registry::new();
//! root.provide_qualified("host", "primary", Definition::factory(|_, _, _| Some("db1")))?;
//!
//! let child = root.child();
//! let host = child.inject("host")?.downcast::<&str>()?;
//! assert_eq!(*host, "db1");
//! # Ok(())
//! # }
//! ```

pub mod bean;
pub mod config;
pub mod errors;
pub mod factories;
pub mod registry;
pub mod resolver;
pub mod token;
pub mod types;

pub use bean::{Bean, InjectOptions};
pub use config::RegistryConfig;
pub use errors::{
    ConfigError, InjectError, DEFERRED, DOWNCAST_FAILED, DUPLICATE_FACTORY, EMPTY_VALUE,
    FACTORY_FAILED, NO_BEAN_DEFINITION, UNDECIDABLE_BEAN,
};
pub use factories::{BeanPromise, Definition, InstanceFactory, IntoProduced, Produced};
pub use registry::Registry;
pub use resolver::Resolver;
pub use token::{Qualifier, Qualifiers, Symbol, Token};
pub use types::{DynError, Injectable, Instance, TypeInfo};
