use crate::Payload;

/// Terminal outcome of a promise, together with the context that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement<T, C, E> {
    Fulfilled { value: T, context: Option<C> },
    Rejected { reason: E, context: Option<C> },
}

impl<T, C, E> Settlement<T, C, E> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled { .. })
    }

    pub fn context(&self) -> Option<&C> {
        match self {
            Settlement::Fulfilled { context, .. } | Settlement::Rejected { context, .. } => {
                context.as_ref()
            }
        }
    }

    /// Drops the context, leaving a plain result
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Settlement::Fulfilled { value, .. } => Ok(value),
            Settlement::Rejected { reason, .. } => Err(reason),
        }
    }

    /// Keeps the own context if there is one, otherwise takes `fallback`
    pub fn or_context(self, fallback: Option<C>) -> Self {
        match self {
            Settlement::Fulfilled { value, context } => Settlement::Fulfilled {
                value,
                context: context.or(fallback),
            },
            Settlement::Rejected { reason, context } => Settlement::Rejected {
                reason,
                context: context.or(fallback),
            },
        }
    }
}

/// One-shot listener receiving a settlement
pub type Reaction<T, C, E> = Box<dyn FnOnce(Settlement<T, C, E>)>;

/// Anything which eventually settles and can report it, context included.
///
/// A promise resolved with a thenable adopts whatever the thenable settles with.
pub trait Thenable<T, C, E> {
    fn on_settled(self: Box<Self>, reaction: Reaction<T, C, E>);
}

/// What a promise gets resolved with
pub enum Resolution<T, C, E> {
    Fulfill(T),
    Reject(E),
    /// Adopt the settlement of another thenable
    Follow(Box<dyn Thenable<T, C, E>>),
}

impl<T, C, E> std::fmt::Debug for Resolution<T, C, E>
where
    T: std::fmt::Debug,
    E: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Fulfill(value) => f.debug_tuple("Fulfill").field(value).finish(),
            Resolution::Reject(reason) => f.debug_tuple("Reject").field(reason).finish(),
            Resolution::Follow(_) => f.write_str("Follow(..)"),
        }
    }
}

/// Return types accepted from continuation callbacks
pub trait IntoResolution<C, E> {
    type Value;

    fn into_resolution(self) -> Resolution<Self::Value, C, E>;
}

impl<T, C, E> IntoResolution<C, E> for Resolution<T, C, E> {
    type Value = T;

    fn into_resolution(self) -> Resolution<T, C, E> {
        self
    }
}

impl<T, C, E> IntoResolution<C, E> for Result<T, E> {
    type Value = T;

    fn into_resolution(self) -> Resolution<T, C, E> {
        match self {
            Ok(value) => Resolution::Fulfill(value),
            Err(reason) => Resolution::Reject(reason),
        }
    }
}

impl<C, E> IntoResolution<C, E> for () {
    type Value = ();

    fn into_resolution(self) -> Resolution<(), C, E> {
        Resolution::Fulfill(())
    }
}

impl<T: Payload, C: Payload, E: Payload> Resolution<T, C, E> {
    pub fn follow(thenable: impl Thenable<T, C, E> + 'static) -> Self {
        Resolution::Follow(Box::new(thenable))
    }
}
