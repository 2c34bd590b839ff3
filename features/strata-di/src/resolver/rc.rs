use std::rc::Rc;

use crate::{
    errors::InjectError,
    registry::Registry,
    resolver::Resolver,
    token::{Qualifier, Token},
    types::Injectable,
};

impl<T: Injectable> Resolver for Rc<T> {
    fn resolve(registry: &Registry, token: Token, qualifier: Qualifier) -> Result<Self, InjectError> {
        registry.inject_qualified(token, qualifier)?.downcast::<T>()
    }
}

impl<Resolvable: Resolver> Resolver for Option<Resolvable> {
    fn resolve(registry: &Registry, token: Token, qualifier: Qualifier) -> Result<Self, InjectError> {
        match Resolvable::resolve(registry, token, qualifier) {
            Ok(resolved) => Ok(Some(resolved)),
            // Only a missing binding is optional, anything bound but broken still fails
            Err(InjectError::NoBeanDefinition { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
