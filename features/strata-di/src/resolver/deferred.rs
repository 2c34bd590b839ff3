use std::rc::Rc;

use strata_promise::prelude::*;

use crate::{
    errors::InjectError,
    factories::BeanPromise,
    registry::Registry,
    resolver::Resolver,
    token::{Qualifier, Token},
    types::Injectable,
};

/// Resolves ready and deferred beans alike.
///
/// Never fails by itself, lookup errors reject the promise in the context of the registry asked.
impl<T: Injectable> Resolver for BeanPromise<Rc<T>> {
    fn resolve(registry: &Registry, token: Token, qualifier: Qualifier) -> Result<Self, InjectError> {
        let promise = match registry.inject_qualified(token, qualifier) {
            Ok(bean) => bean.into_promise::<T>(Some(registry.clone())),
            Err(e) => ContextPromise::reject(e, Some(registry.clone())),
        };
        Ok(promise)
    }
}
