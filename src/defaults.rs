//! Process-wide default concurrency and free-function wrappers around a
//! default-configured `BoundedIter`.

use crate::config::BoundedIter;
use anyhow::Result;
use std::num::NonZeroUsize;
use std::sync::OnceLock;

static DEFAULT_MAX: OnceLock<usize> = OnceLock::new();

/// Default cap used when `max_concurrency` is 0: the hardware parallelism
/// reported by the OS (8 when it cannot tell). Computed once.
pub fn default_max_concurrency() -> usize {
    *DEFAULT_MAX.get_or_init(|| {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(8)
    })
}

pub fn for_each<T, F>(input: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    BoundedIter::default().for_each(input, f)
}

pub fn for_each_indexed<T, F>(input: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync,
{
    BoundedIter::default().for_each_indexed(input, f)
}

pub fn try_for_each<T, F>(input: &mut [T], f: F) -> Result<()>
where
    T: Send,
    F: Fn(&mut T) -> Result<()> + Sync,
{
    BoundedIter::default().try_for_each(input, f)
}

pub fn try_for_each_indexed<T, F>(input: &mut [T], f: F) -> Result<()>
where
    T: Send,
    F: Fn(usize, &mut T) -> Result<()> + Sync,
{
    BoundedIter::default().try_for_each_indexed(input, f)
}
