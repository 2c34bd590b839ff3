//! Strata Promise is a deferred value which carries a context through its continuations.
//!
//! It mirrors the usual promise contract - `then`, `catch`, `finally` and the
//! `all`/`any`/`race`/`all_settled` combinators - except that every settlement also carries
//! an optional context. Each callback receives it next to the value or reason, and it keeps
//! flowing down the chain unless a followed thenable reports a newer one.
//!
//! The model is single threaded and cooperative.
//! Listeners never run inline, they are deferred to the next [tick] of the current thread.
//!
//! # Examples
//!
//! ```rust
//! use strata_promise::{prelude::*, tick};
//!
//! let (promise, resolver) = ContextPromise::<u32, &str, String>::pending();
//! let doubled = promise.then(|value, context| {
//!     assert_eq!(context, Some("origin"));
//!     Ok(value * 2)
//! });
//!
//! resolver.resolve(21, Some("origin"));
//! let settlement = tick::run_until(doubled).unwrap();
//! assert_eq!(settlement.into_result(), Ok(42));
//! ```

pub mod combinators;
pub mod promise;
pub mod settlement;
pub mod species;
pub mod tick;

pub use combinators::{AggregateError, Input};
pub use promise::{ContextPromise, Resolver};
pub use settlement::{IntoResolution, Reaction, Resolution, Settlement, Thenable};
pub use species::Species;

/// Values, contexts and reasons are cloned once per listener, and listeners run on a later tick
pub trait Payload: Clone + 'static {}
impl<T: Clone + 'static> Payload for T {}

pub mod prelude {
    pub use crate::{
        AggregateError, ContextPromise, Input, IntoResolution, Payload, Resolution, Resolver,
        Settlement, Species, Thenable,
    };
}
