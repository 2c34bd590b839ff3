use crate::{
    promise::ContextPromise,
    settlement::{IntoResolution, Resolution, Settlement},
    Payload,
};

/// The continuation contract, shared by [ContextPromise] and any type wrapping it.
///
/// Continuations never build a [ContextPromise] directly. They go through [Species::derive],
/// so a wrapper type gets its own type back from `then`, `catch` and `finally`.
pub trait Species<T: Payload, C: Payload, E: Payload>: Sized {
    /// The same kind of promise, settling with `U`
    type Of<U: Payload>: Species<U, C, E>;

    /// The promise driving this value
    fn promise(&self) -> &ContextPromise<T, C, E>;

    /// Wraps a freshly derived promise
    fn derive<U: Payload>(promise: ContextPromise<U, C, E>) -> Self::Of<U>;

    /// Continues with one of two callbacks, depending on how this settles.
    ///
    /// Both receive the context of the settlement. The derived promise keeps that
    /// context, unless a callback hands back a thenable reporting its own.
    fn then_or<F, R, G, S>(&self, on_fulfilled: F, on_rejected: G) -> Self::Of<R::Value>
    where
        F: FnOnce(T, Option<C>) -> R + 'static,
        R: IntoResolution<C, E>,
        R::Value: Payload,
        G: FnOnce(E, Option<C>) -> S + 'static,
        S: IntoResolution<C, E, Value = R::Value>,
    {
        let (next, resolver) = ContextPromise::<R::Value, C, E>::pending();
        self.promise()
            .subscribe(Box::new(move |settlement| match settlement {
                Settlement::Fulfilled { value, context } => {
                    resolver.resolve_with(on_fulfilled(value, context.clone()), context)
                }
                Settlement::Rejected { reason, context } => {
                    resolver.resolve_with(on_rejected(reason, context.clone()), context)
                }
            }));
        Self::derive::<R::Value>(next)
    }

    /// Continues on fulfillment, rejections pass through untouched
    fn then<F, R>(&self, on_fulfilled: F) -> Self::Of<R::Value>
    where
        F: FnOnce(T, Option<C>) -> R + 'static,
        R: IntoResolution<C, E>,
        R::Value: Payload,
    {
        self.then_or(on_fulfilled, |reason: E, _: Option<C>| {
            Resolution::<R::Value, C, E>::Reject(reason)
        })
    }

    /// Continues on rejection, values pass through untouched
    fn catch<G, S>(&self, on_rejected: G) -> Self::Of<T>
    where
        G: FnOnce(E, Option<C>) -> S + 'static,
        S: IntoResolution<C, E, Value = T>,
    {
        self.then_or(
            |value: T, _: Option<C>| Resolution::<T, C, E>::Fulfill(value),
            on_rejected,
        )
    }

    /// Runs `on_finally` on either outcome and passes the original settlement on.
    ///
    /// If `on_finally` rejects, or hands back a thenable which rejects, that rejection wins.
    fn finally<F, R>(&self, on_finally: F) -> Self::Of<T>
    where
        F: FnOnce() -> R + 'static,
        R: IntoResolution<C, E>,
        R::Value: Payload,
    {
        let (next, resolver) = ContextPromise::<T, C, E>::pending();
        self.promise().subscribe(Box::new(move |settlement| {
            match on_finally().into_resolution() {
                Resolution::Fulfill(_) => resolver.settle_with(settlement),
                Resolution::Reject(reason) => {
                    resolver.reject(reason, settlement.context().cloned())
                }
                Resolution::Follow(thenable) => {
                    thenable.on_settled(Box::new(move |outcome| match outcome {
                        Settlement::Rejected { reason, context } => {
                            resolver.reject(reason, context.or_else(|| settlement.context().cloned()))
                        }
                        Settlement::Fulfilled { .. } => resolver.settle_with(settlement),
                    }))
                }
            }
        }));
        Self::derive::<T>(next)
    }
}

impl<T: Payload, C: Payload, E: Payload> Species<T, C, E> for ContextPromise<T, C, E> {
    type Of<U: Payload> = ContextPromise<U, C, E>;

    fn promise(&self) -> &ContextPromise<T, C, E> {
        self
    }

    fn derive<U: Payload>(promise: ContextPromise<U, C, E>) -> ContextPromise<U, C, E> {
        promise
    }
}
