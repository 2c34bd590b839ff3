use std::{
    cell::RefCell,
    collections::{hash_map::Entry, HashMap},
    rc::Rc,
};

use thiserror::Error;

use crate::{promise::ContextPromise, settlement::Settlement, Payload};

/// One input of a combinator
pub enum Input<T, C, E> {
    Value(T),
    Promise(ContextPromise<T, C, E>),
}

impl<T, C, E> From<ContextPromise<T, C, E>> for Input<T, C, E> {
    fn from(promise: ContextPromise<T, C, E>) -> Self {
        Input::Promise(promise)
    }
}

impl<T, C, E> From<&ContextPromise<T, C, E>> for Input<T, C, E> {
    fn from(promise: &ContextPromise<T, C, E>) -> Self {
        Input::Promise(promise.clone())
    }
}

/// Rejection reason of [ContextPromise::any] - every input rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("All {} inputs were rejected", .errors.len())]
pub struct AggregateError<E> {
    /// Reasons in input order
    pub errors: Vec<E>,
}

/// A distinct input and every position it was passed at
struct Group<T, C, E> {
    promise: ContextPromise<T, C, E>,
    positions: Vec<usize>,
}

/// Groups inputs by identity - the same promise passed twice only has to settle once.
///
/// Returns the groups and the number of positions.
fn group<T, C, E, I>(inputs: I) -> (Vec<Group<T, C, E>>, usize)
where
    T: Payload,
    C: Payload,
    E: Payload,
    I: IntoIterator,
    I::Item: Into<Input<T, C, E>>,
{
    let mut groups: Vec<Group<T, C, E>> = Vec::new();
    let mut seen: HashMap<usize, usize> = HashMap::new();
    let mut len = 0;

    for (position, input) in inputs.into_iter().enumerate() {
        len = position + 1;
        match input.into() {
            Input::Value(value) => groups.push(Group {
                promise: ContextPromise::resolve(value, None),
                positions: vec![position],
            }),
            Input::Promise(promise) => match seen.entry(promise.identity()) {
                Entry::Occupied(index) => groups[*index.get()].positions.push(position),
                Entry::Vacant(slot) => {
                    slot.insert(groups.len());
                    groups.push(Group {
                        promise,
                        positions: vec![position],
                    });
                }
            },
        }
    }

    (groups, len)
}

/// Slots filled as inputs settle
struct Tally<V> {
    slots: Vec<Option<V>>,
    remaining: usize,
}

impl<V: Clone> Tally<V> {
    fn new(len: usize, remaining: usize) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Tally {
            slots: vec![None; len],
            remaining,
        }))
    }

    /// Records `value` at every position, returns all slots once the last group reported
    fn record(&mut self, positions: &[usize], value: V) -> Option<Vec<V>> {
        for &position in positions {
            self.slots[position] = Some(value.clone());
        }
        self.remaining -= 1;

        if self.remaining > 0 {
            return None;
        }
        Some(self.slots.drain(..).flatten().collect())
    }
}

impl<T: Payload, C: Payload, E: Payload> ContextPromise<T, C, E> {
    /// Fulfills with every value in input order, or rejects with the first rejection.
    ///
    /// Inputs still pending after a rejection are abandoned, not awaited.
    pub fn all<I>(inputs: I, context: Option<C>) -> ContextPromise<Vec<T>, C, E>
    where
        I: IntoIterator,
        I::Item: Into<Input<T, C, E>>,
    {
        let (groups, len) = group(inputs);
        let (promise, resolver) = ContextPromise::pending();
        if groups.is_empty() {
            resolver.resolve(Vec::new(), context);
            return promise;
        }

        let tally = Tally::new(len, groups.len());
        for Group { promise: input, positions } in groups {
            let tally = tally.clone();
            let resolver = resolver.clone();
            let context = context.clone();
            input.subscribe(Box::new(move |settlement| match settlement {
                Settlement::Fulfilled { value, .. } => {
                    let done = tally.borrow_mut().record(&positions, value);
                    if let Some(values) = done {
                        resolver.resolve(values, context);
                    }
                }
                Settlement::Rejected { reason, context: own } => {
                    resolver.reject(reason, own.or(context))
                }
            }));
        }
        promise
    }

    /// Fulfills with the first fulfillment, or rejects once every input rejected.
    ///
    /// Rejects right away with an empty [AggregateError] if there are no inputs.
    pub fn any<I>(inputs: I, context: Option<C>) -> ContextPromise<T, C, AggregateError<E>>
    where
        I: IntoIterator,
        I::Item: Into<Input<T, C, E>>,
    {
        let (groups, len) = group(inputs);
        let (promise, resolver) = ContextPromise::pending();
        if groups.is_empty() {
            resolver.reject(AggregateError { errors: Vec::new() }, context);
            return promise;
        }

        let tally = Tally::new(len, groups.len());
        for Group { promise: input, positions } in groups {
            let tally = tally.clone();
            let resolver = resolver.clone();
            let context = context.clone();
            input.subscribe(Box::new(move |settlement| match settlement {
                Settlement::Fulfilled { value, context: own } => {
                    resolver.resolve(value, own.or(context))
                }
                Settlement::Rejected { reason, .. } => {
                    let done = tally.borrow_mut().record(&positions, reason);
                    if let Some(errors) = done {
                        resolver.reject(AggregateError { errors }, context);
                    }
                }
            }));
        }
        promise
    }

    /// Settles like whichever input settles first, keeping that input's context.
    ///
    /// Never settles if there are no inputs.
    pub fn race<I>(inputs: I, context: Option<C>) -> ContextPromise<T, C, E>
    where
        I: IntoIterator,
        I::Item: Into<Input<T, C, E>>,
    {
        let (groups, _) = group(inputs);
        let (promise, resolver) = ContextPromise::pending();

        for Group { promise: input, .. } in groups {
            let resolver = resolver.clone();
            let context = context.clone();
            input.subscribe(Box::new(move |settlement| {
                resolver.settle_with(settlement.or_context(context))
            }));
        }
        promise
    }

    /// Always fulfills, with one settlement per input once all of them settled
    pub fn all_settled<I>(inputs: I, context: Option<C>) -> ContextPromise<Vec<Settlement<T, C, E>>, C, E>
    where
        I: IntoIterator,
        I::Item: Into<Input<T, C, E>>,
    {
        let (groups, len) = group(inputs);
        let (promise, resolver) = ContextPromise::pending();
        if groups.is_empty() {
            resolver.resolve(Vec::new(), context);
            return promise;
        }

        let tally = Tally::new(len, groups.len());
        for Group { promise: input, positions } in groups {
            let tally = tally.clone();
            let resolver = resolver.clone();
            let context = context.clone();
            input.subscribe(Box::new(move |settlement| {
                let done = tally.borrow_mut().record(&positions, settlement);
                if let Some(outcomes) = done {
                    resolver.resolve(outcomes, context);
                }
            }));
        }
        promise
    }
}
