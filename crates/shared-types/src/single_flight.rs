//! Single-flight guard for periodic jobs.
//!
//! Each component instance owns its own guard. A job that finds the guard
//! held skips its run instead of queueing behind the current one.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SingleFlight {
    busy: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the guard, or `None` when a run is already in flight.
    ///
    /// The returned permit releases the guard when dropped, including on
    /// early return or panic unwinding.
    pub fn try_acquire(&self) -> Option<FlightPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit { owner: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[must_use = "the guard is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct FlightPermit<'a> {
    owner: &'a SingleFlight,
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        self.owner.busy.store(false, Ordering::Release);
    }
}
