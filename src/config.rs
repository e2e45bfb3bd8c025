use crate::defaults::default_max_concurrency;
use std::io;
use std::thread::{self, Scope, ScopedJoinHandle};

/// Iterator configuration: a plain value with builder chaining.
///
/// Calls never modify it, so one value can be reused across many calls,
/// including overlapping calls from different threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundedIter {
    pub max_concurrency: usize,   // 0 = use default_max_concurrency()
    pub stack_size: Option<usize>, // worker stack size, None = platform default
}

impl BoundedIter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Concurrency cap for one call over `len` elements.
    /// Falls back to the process-wide default when unset, then clamps to `len`.
    pub fn effective_limit(&self, len: usize) -> usize {
        let max = if self.max_concurrency == 0 {
            default_max_concurrency()
        } else {
            self.max_concurrency
        };
        max.min(len)
    }

    /// Start worker number `n` of a call inside `scope`.
    pub(crate) fn spawn_worker<'scope, 'env, F>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        n: usize,
        f: F,
    ) -> io::Result<ScopedJoinHandle<'scope, ()>>
    where
        F: FnOnce() + Send + 'scope,
    {
        let mut builder = thread::Builder::new().name(format!("bounded-iter-{n}"));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        builder.spawn_scoped(scope, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_limit_uses_default_then_clamps() {
        let it = BoundedIter::new();
        let d = default_max_concurrency();
        assert_eq!(it.effective_limit(d + 10), d);
        assert_eq!(it.effective_limit(1), 1);
    }

    #[test]
    fn explicit_limit_is_clamped_to_len() {
        let it = BoundedIter::new().with_max_concurrency(999);
        assert_eq!(it.effective_limit(3), 3);
        assert_eq!(it.effective_limit(5000), 999);
        assert_eq!(it.max_concurrency, 999);
    }

    #[test]
    fn empty_input_has_zero_limit() {
        assert_eq!(BoundedIter::new().with_max_concurrency(4).effective_limit(0), 0);
    }

    #[test]
    fn worker_carries_name_and_runs() {
        let it = BoundedIter::new().with_stack_size(256 * 1024);
        thread::scope(|s| {
            let handle = it
                .spawn_worker(s, 3, || {
                    assert_eq!(thread::current().name(), Some("bounded-iter-3"));
                })
                .unwrap();
            handle.join().unwrap();
        });
    }
}
