mod config;
mod concurrency;
mod defaults;
mod failure;
mod limiter;
mod queue;
mod util;

pub use crate::config::BoundedIter;
pub use crate::defaults::{default_max_concurrency, for_each, for_each_indexed, try_for_each, try_for_each_indexed};

// Expose the limiter so callers can gate their own work the same way.
pub use crate::limiter::{Limiter, Permit};

pub use crate::util::init_tracing_once;
