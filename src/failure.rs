//! First-failure slot shared by the units of one call.

use parking_lot::Mutex;
use std::any::Any;
use std::convert::Infallible;

/// What a unit of work can fail with.
pub(crate) enum Failure<E> {
    /// Payload caught by `catch_unwind`, re-raised untouched.
    Panic(Box<dyn Any + Send + 'static>),
    /// Error returned by a fallible application.
    Error(E),
}

impl Failure<Infallible> {
    pub(crate) fn into_panic(self) -> Box<dyn Any + Send + 'static> {
        match self {
            Failure::Panic(payload) => payload,
            Failure::Error(never) => match never {},
        }
    }
}

/// Keeps the first failure offered to it; later ones are dropped.
pub(crate) struct FirstFailure<P> {
    slot: Mutex<Option<P>>,
}

impl<P> FirstFailure<P> {
    pub(crate) fn new() -> Self {
        Self { slot: Mutex::new(None) }
    }

    /// Returns true if `failure` was kept.
    pub(crate) fn record(&self, failure: P) -> bool {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(failure);
        true
    }

    pub(crate) fn into_inner(self) -> Option<P> {
        self.slot.into_inner()
    }
}
