use crate::{errors::InjectError, registry::Registry, token::{Qualifier, Token}};

pub mod deferred;
pub mod rc;

/// Allows custom behaviour on injection
///
/// Implemented for `Rc<T>`, `Option<R>` and [BeanPromise](crate::factories::BeanPromise)`<Rc<T>>`.
pub trait Resolver: Sized {
    fn resolve(registry: &Registry, token: Token, qualifier: Qualifier) -> Result<Self, InjectError>;
}
