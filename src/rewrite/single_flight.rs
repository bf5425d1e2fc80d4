use std::cell::Cell;

/// At most one rewrite in flight per process.
///
/// `try_acquire` hands out a guard that releases the slot when dropped, so
/// an error or early return anywhere in the request path cannot leave the
/// slot taken.
#[derive(Debug, Default)]
pub struct SingleFlight {
    busy: Cell<bool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<FlightGuard<'_>> {
        if self.busy.replace(true) {
            return None;
        }
        Some(FlightGuard { flight: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }
}

#[derive(Debug)]
pub struct FlightGuard<'a> {
    flight: &'a SingleFlight,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flight.busy.set(false);
    }
}
