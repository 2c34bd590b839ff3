use std::{
    cell::RefCell,
    fmt::Debug,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use crate::{
    settlement::{IntoResolution, Reaction, Resolution, Settlement, Thenable},
    species::Species,
    tick, Payload,
};

/// A deferred value which carries the context that settled it along every continuation.
///
/// Handles are cheap to clone, all clones observe the same state.
/// A promise transitions at most once, from pending to either fulfilled or rejected.
/// Every listener is notified on a later [tick], never inline.
pub struct ContextPromise<T, C, E> {
    shared: Rc<RefCell<Shared<T, C, E>>>,
}

struct Shared<T, C, E> {
    state: State<T, C, E>,
    /// Set once a resolution was accepted - either settled or following a thenable
    locked: bool,
    wakers: Vec<Waker>,
}

enum State<T, C, E> {
    Pending(Vec<Reaction<T, C, E>>),
    Settled(Settlement<T, C, E>),
}

impl<T, C, E> Clone for ContextPromise<T, C, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Debug, C: Debug, E: Debug> Debug for ContextPromise<T, C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.shared.borrow().state {
            State::Pending(reactions) => f
                .debug_struct("ContextPromise")
                .field("listeners", &reactions.len())
                .finish_non_exhaustive(),
            State::Settled(settlement) => f.debug_tuple("ContextPromise").field(settlement).finish(),
        }
    }
}

impl<T: Payload, C: Payload, E: Payload> ContextPromise<T, C, E> {
    /// Creates a pending promise and the handle that settles it
    pub fn pending() -> (Self, Resolver<T, C, E>) {
        let promise = Self {
            shared: Rc::new(RefCell::new(Shared {
                state: State::Pending(Vec::new()),
                locked: false,
                wakers: Vec::new(),
            })),
        };
        let resolver = Resolver {
            promise: promise.clone(),
        };
        (promise, resolver)
    }

    /// Creates a promise and hands its resolver to `executor` right away
    pub fn new(executor: impl FnOnce(Resolver<T, C, E>)) -> Self {
        let (promise, resolver) = Self::pending();
        executor(resolver);
        promise
    }

    pub fn resolve(value: T, context: Option<C>) -> Self {
        Self::new(|resolver| resolver.resolve(value, context))
    }

    pub fn reject(reason: E, context: Option<C>) -> Self {
        Self::new(|resolver| resolver.reject(reason, context))
    }

    /// Adopts the settlement of `thenable`.
    ///
    /// A context reported by the thenable wins over `context`.
    pub fn follow(thenable: impl Thenable<T, C, E> + 'static, context: Option<C>) -> Self {
        Self::new(|resolver| resolver.resolve_with(Resolution::follow(thenable), context))
    }

    /// The outcome, if already settled
    pub fn settlement(&self) -> Option<Settlement<T, C, E>> {
        match &self.shared.borrow().state {
            State::Pending(_) => None,
            State::Settled(settlement) => Some(settlement.clone()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.shared.borrow().state, State::Pending(_))
    }

    /// Exposes value and context together as one tuple
    pub fn context(&self) -> ContextPromise<(T, Option<C>), C, E> {
        self.then(|value, context| Ok((value, context)))
    }

    /// True if both handles point at the same promise
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.shared, &b.shared)
    }

    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.shared) as *const () as usize
    }

    /// Registers a listener, it always runs on a later tick
    pub(crate) fn subscribe(&self, reaction: Reaction<T, C, E>) {
        let mut shared = self.shared.borrow_mut();
        match &mut shared.state {
            State::Pending(reactions) => reactions.push(reaction),
            State::Settled(settlement) => {
                let settlement = settlement.clone();
                tick::defer(move || reaction(settlement));
            }
        }
    }

    fn settle(&self, settlement: Settlement<T, C, E>) {
        let (reactions, wakers) = {
            let mut shared = self.shared.borrow_mut();
            let reactions = match &mut shared.state {
                State::Settled(_) => {
                    tracing::trace!("Promise already settled - ignoring settlement");
                    return;
                }
                State::Pending(reactions) => std::mem::take(reactions),
            };
            shared.state = State::Settled(settlement.clone());
            (reactions, std::mem::take(&mut shared.wakers))
        };

        tracing::trace!(
            "Promise {} - notifying {} listeners",
            if settlement.is_fulfilled() { "fulfilled" } else { "rejected" },
            reactions.len()
        );
        for reaction in reactions {
            let settlement = settlement.clone();
            tick::defer(move || reaction(settlement));
        }
        for waker in wakers {
            waker.wake();
        }
    }
}

impl<T: Payload, C: Payload, E: Payload> Thenable<T, C, E> for ContextPromise<T, C, E> {
    fn on_settled(self: Box<Self>, reaction: Reaction<T, C, E>) {
        self.subscribe(reaction);
    }
}

impl<T: Payload, C: Payload, E: Payload> IntoResolution<C, E> for ContextPromise<T, C, E> {
    type Value = T;

    fn into_resolution(self) -> Resolution<T, C, E> {
        Resolution::follow(self)
    }
}

impl<T: Payload, C: Payload, E: Payload> Future for ContextPromise<T, C, E> {
    type Output = Settlement<T, C, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = self.shared.borrow_mut();
        if let State::Settled(settlement) = &shared.state {
            return Poll::Ready(settlement.clone());
        }

        if !shared.wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
            shared.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

/// Settles the promise it was created with.
///
/// The first accepted resolution wins, every later call is ignored.
pub struct Resolver<T, C, E> {
    promise: ContextPromise<T, C, E>,
}

impl<T, C, E> Clone for Resolver<T, C, E> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T: Payload, C: Payload, E: Payload> Resolver<T, C, E> {
    pub fn resolve(&self, value: T, context: Option<C>) {
        self.resolve_with(Resolution::Fulfill(value), context);
    }

    pub fn reject(&self, reason: E, context: Option<C>) {
        self.resolve_with(Resolution::Reject(reason), context);
    }

    /// Resolves with a value, a rejection, or another thenable to follow
    pub fn resolve_with(&self, resolution: impl IntoResolution<C, E, Value = T>, context: Option<C>) {
        if !self.lock() {
            tracing::trace!("Promise already resolved - ignoring resolution");
            return;
        }

        match resolution.into_resolution() {
            Resolution::Fulfill(value) => self.promise.settle(Settlement::Fulfilled { value, context }),
            Resolution::Reject(reason) => self.promise.settle(Settlement::Rejected { reason, context }),
            Resolution::Follow(thenable) => {
                let promise = self.promise.clone();
                thenable.on_settled(Box::new(move |settlement| {
                    promise.settle(settlement.or_context(context))
                }));
            }
        }
    }

    /// Passes an existing settlement through unchanged
    pub fn settle_with(&self, settlement: Settlement<T, C, E>) {
        if !self.lock() {
            tracing::trace!("Promise already resolved - ignoring settlement");
            return;
        }
        self.promise.settle(settlement);
    }

    pub fn promise(&self) -> &ContextPromise<T, C, E> {
        &self.promise
    }

    fn lock(&self) -> bool {
        let mut shared = self.promise.shared.borrow_mut();
        !std::mem::replace(&mut shared.locked, true)
    }
}
