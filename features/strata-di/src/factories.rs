use std::{rc::Rc, sync::Arc};

use strata_promise::prelude::*;

use crate::{
    errors::InjectError,
    registry::Registry,
    token::Token,
    types::{DynError, Injectable, Instance},
};

/// A promise settled in the context of a [Registry]
pub type BeanPromise<T> = ContextPromise<T, Registry, InjectError>;

/// What a factory or literal definition produced, before validation
pub enum Produced {
    Value(Instance),
    /// The absent value - always an error once validated
    Empty,
    /// Validated once it settles
    Pending(BeanPromise<Option<Instance>>),
    Failed(DynError),
}

/// Return types accepted from factories
pub trait IntoProduced {
    fn into_produced(self) -> Produced;
}

impl<T: Injectable> IntoProduced for Option<T> {
    fn into_produced(self) -> Produced {
        match self {
            Some(value) => Produced::Value(Instance::new(value)),
            None => Produced::Empty,
        }
    }
}

impl<T: Injectable, Err: Into<DynError>> IntoProduced for Result<Option<T>, Err> {
    fn into_produced(self) -> Produced {
        match self {
            Ok(value) => value.into_produced(),
            Err(error) => Produced::Failed(error.into()),
        }
    }
}

impl<T: Injectable + Clone> IntoProduced for BeanPromise<Option<T>> {
    fn into_produced(self) -> Produced {
        Produced::Pending(self.then(|value, _| Ok(value.map(Instance::new))))
    }
}

/// A Factory providing values for a token
///
/// Invoked with the registry owning the binding, the token, and every explicit qualifier
/// the binding was provided under - empty if it was provided under the default one.
pub trait InstanceFactory: 'static {
    fn construct(&self, registry: &Registry, token: &Token, qualifiers: &[Arc<str>]) -> Produced;
}

// Impl InstanceFactory for any fitting closure
impl<F, R> InstanceFactory for F
where
    F: Fn(&Registry, &Token, &[Arc<str>]) -> R + 'static,
    R: IntoProduced,
{
    fn construct(&self, registry: &Registry, token: &Token, qualifiers: &[Arc<str>]) -> Produced {
        self(registry, token, qualifiers).into_produced()
    }
}

/// Either a literal value or a factory
pub enum Definition {
    Literal(Produced),
    Factory(Rc<dyn InstanceFactory>),
}

impl Definition {
    pub fn value<T: Injectable>(value: T) -> Self {
        Definition::Literal(Produced::Value(Instance::new(value)))
    }

    pub fn instance(instance: Instance) -> Self {
        Definition::Literal(Produced::Value(instance))
    }

    /// A literal absent value
    pub fn empty() -> Self {
        Definition::Literal(Produced::Empty)
    }

    /// A literal value which is still on its way
    pub fn deferred<T: Injectable + Clone>(promise: BeanPromise<Option<T>>) -> Self {
        Definition::Literal(promise.into_produced())
    }

    /// A factory returning `Option<T>`, `Result<Option<T>, E>` or a [BeanPromise] of `Option<T>`
    pub fn factory<F, R>(factory: F) -> Self
    where
        F: Fn(&Registry, &Token, &[Arc<str>]) -> R + 'static,
        R: IntoProduced,
    {
        Definition::Factory(Rc::new(factory))
    }

    /// A factory implemented on a custom type
    pub fn factory_from(factory: impl InstanceFactory) -> Self {
        Definition::Factory(Rc::new(factory))
    }
}
