use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts simultaneously-active applications and remembers the peak.
#[derive(Default)]
pub struct Gauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    /// Mark one application as running until the returned guard drops.
    pub fn enter(&self) -> GaugeGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard { gauge: self }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct GaugeGuard<'a> {
    gauge: &'a Gauge,
}

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.gauge.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Read a `panic!("literal")` or `panic!("{}", ..)` payload as text.
pub fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return Some(s.to_string());
    }
    payload.downcast_ref::<String>().cloned()
}
