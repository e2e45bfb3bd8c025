//! Concurrency helper: apply a function to every element of a slice, at most
//! `limit` applications in flight, joining before returning.

use crate::config::BoundedIter;
use crate::failure::{Failure, FirstFailure};
use crate::limiter::{Limiter, Permit};
use crate::queue::WorkQueue;
use anyhow::Result;
use std::convert::Infallible;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

impl BoundedIter {
    /// Apply `f` to every element, in place.
    ///
    /// A panic inside `f` is re-raised here, with its original payload, once
    /// every other application has finished.
    pub fn for_each<T, F>(&self, input: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync,
    {
        self.for_each_indexed(input, |_, item| f(item))
    }

    /// Like [`BoundedIter::for_each`], but `f` also receives the element's position.
    pub fn for_each_indexed<T, F>(&self, input: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync,
    {
        let first = drive(self, input, |i, item| {
            catch_unwind(AssertUnwindSafe(|| f(i, item))).map_err(Failure::<Infallible>::Panic)
        });
        if let Some(failure) = first {
            resume_unwind(failure.into_panic());
        }
    }

    /// Fallible variant: the first `Err` is returned after the join. Panics still resume.
    pub fn try_for_each<T, F>(&self, input: &mut [T], f: F) -> Result<()>
    where
        T: Send,
        F: Fn(&mut T) -> Result<()> + Sync,
    {
        self.try_for_each_indexed(input, |_, item| f(item))
    }

    /// Like [`BoundedIter::try_for_each`], but `f` also receives the element's position.
    pub fn try_for_each_indexed<T, F>(&self, input: &mut [T], f: F) -> Result<()>
    where
        T: Send,
        F: Fn(usize, &mut T) -> Result<()> + Sync,
    {
        let first = drive(self, input, |i, item| match catch_unwind(AssertUnwindSafe(|| f(i, item))) {
            Ok(res) => res.map_err(Failure::Error),
            Err(payload) => Err(Failure::Panic(payload)),
        });
        match first {
            None => Ok(()),
            Some(Failure::Error(e)) => Err(e),
            Some(Failure::Panic(payload)) => resume_unwind(payload),
        }
    }
}

/// One element handed to a worker, holding its limiter slot.
struct Unit<'a, T> {
    index: usize,
    item: &'a mut T,
    permit: Permit<'a>,
}

/// Launch one unit per element, gated by a `Limiter` of `limit` slots, and
/// wait for all of them.
///
/// Workers start lazily: a new one only when a slot is granted and every
/// worker started so far is busy, so at most `limit` threads ever exist and a
/// cheap `apply` runs on a handful of them. If a worker cannot be started the
/// unit runs on the calling thread instead.
/// `apply` must not unwind; it reports failures as `Err`.
fn drive<T, P, A>(opts: &BoundedIter, input: &mut [T], apply: A) -> Option<P>
where
    T: Send,
    P: Send,
    A: Fn(usize, &mut T) -> std::result::Result<(), P> + Sync,
{
    let n = input.len();
    if n == 0 {
        return None;
    }

    let limit = opts.effective_limit(n);
    tracing::debug!(elements = n, limit, "bounded for_each");

    let limiter = Limiter::new(limit);
    let first = FirstFailure::new();
    let completed = AtomicUsize::new(0);
    let queue = WorkQueue::new();
    let items = input.iter_mut().enumerate();

    let run = |index: usize, item: &mut T| {
        if let Err(failure) = apply(index, item) {
            offer(&first, index, failure);
        }
        completed.fetch_add(1, Ordering::Release);
    };

    let workers = thread::scope(|scope| {
        let mut workers = 0usize;
        let mut degraded = false;
        for (index, item) in items {
            let permit = limiter.acquire();
            queue.push(Unit { index, item, permit });
            if queue.claim_idle() || workers >= limit {
                continue;
            }

            if !degraded {
                let (run, queue) = (&run, &queue);
                let spawned = opts.spawn_worker(scope, workers, move || {
                    while let Some(Unit { index, item, permit }) = queue.pop() {
                        run(index, item);
                        // Announce before the slot frees, so whoever takes
                        // the slot hands its unit to this worker.
                        queue.mark_idle();
                        drop(permit);
                    }
                });
                match spawned {
                    Ok(_) => {
                        workers += 1;
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, workers, limit, "cannot start worker; applying on the calling thread");
                        degraded = true;
                    }
                }
            }

            if let Some(Unit { index, item, permit }) = queue.try_pop() {
                run(index, item);
                drop(permit);
            }
        }
        queue.close();
        workers
    });

    tracing::trace!(workers, "bounded for_each joined");
    debug_assert!(workers <= limit);
    debug_assert_eq!(completed.load(Ordering::Acquire), n);
    debug_assert_eq!(limiter.available(), limit);
    first.into_inner()
}

fn offer<P>(first: &FirstFailure<P>, index: usize, failure: P) {
    if first.record(failure) {
        tracing::trace!(index, "recorded first failure");
    } else {
        tracing::trace!(index, "discarding later failure");
    }
}
