use std::{any::type_name, rc::Rc};

use strata_promise::prelude::*;

use crate::{
    errors::InjectError,
    factories::BeanPromise,
    registry::Registry,
    token::Qualifier,
    types::{Injectable, Instance},
};

/// A resolved binding - either here already, or on its way
#[derive(Debug, Clone)]
pub enum Bean {
    Ready(Instance),
    /// Rejects with [InjectError::EmptyValue] if it settles empty
    Deferred(BeanPromise<Instance>),
}

impl Bean {
    pub fn instance(&self) -> Option<&Instance> {
        match self {
            Bean::Ready(instance) => Some(instance),
            Bean::Deferred(_) => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Bean::Deferred(_))
    }

    /// The ready value as a `T`
    pub fn downcast<T: Injectable>(&self) -> Result<Rc<T>, InjectError> {
        match self {
            Bean::Ready(instance) => downcast(instance),
            Bean::Deferred(_) => Err(InjectError::Deferred {
                required_type: type_name::<T>(),
            }),
        }
    }

    /// The value as a promise of `T`, whether ready or not.
    ///
    /// A ready value settles with `context`.
    pub fn into_promise<T: Injectable>(self, context: Option<Registry>) -> BeanPromise<Rc<T>> {
        match self {
            Bean::Ready(instance) => match downcast(&instance) {
                Ok(value) => BeanPromise::resolve(value, context),
                Err(error) => BeanPromise::reject(error, context),
            },
            Bean::Deferred(promise) => promise.then(|instance, _| downcast::<T>(&instance)),
        }
    }
}

pub(crate) fn downcast<T: Injectable>(instance: &Instance) -> Result<Rc<T>, InjectError> {
    instance
        .downcast()
        .map_err(|actual_type| InjectError::DowncastFailed {
            required_type: type_name::<T>(),
            actual_type,
        })
}

/// How to inject
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectOptions {
    pub qualifier: Qualifier,
    /// Run the factory again instead of using the cached value - the cache is left as it is
    pub force_evaluation: bool,
}

impl InjectOptions {
    pub fn qualifier(mut self, qualifier: impl Into<Qualifier>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    pub fn force_evaluation(mut self, force_evaluation: bool) -> Self {
        self.force_evaluation = force_evaluation;
        self
    }
}

impl From<Qualifier> for InjectOptions {
    fn from(qualifier: Qualifier) -> Self {
        InjectOptions {
            qualifier,
            ..Default::default()
        }
    }
}
