//! Sound detector glue.
//!
//! The detector module pulls its digital output low when the sound level
//! jumps.  Whatever waits on that pin calls [`EdgeListener::on_edge`];
//! [`EdgeForwarder`] turns each call into an [`Event::AcousticEdge`] on
//! the orchestrator's queue.  The counter itself lives in the orchestrator
//! so that it only ever has one writer.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::event::{Event, EventSink};
use crate::sensor::EdgeListener;

/// Forwards edges into an event queue, counting the ones that did not fit.
pub struct EdgeForwarder<S> {
    sink: S,
    dropped: AtomicU32,
}

impl<S: EventSink> EdgeForwarder<S> {
    pub const fn new(sink: S) -> Self {
        Self {
            sink,
            dropped: AtomicU32::new(0),
        }
    }

    /// Edges lost to a full queue since startup.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<S: EventSink> EdgeListener for EdgeForwarder<S> {
    fn on_edge(&self) {
        if self.sink.try_push(Event::AcousticEdge).is_err() {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
            warn!("Event queue full - sound edge dropped ({} total)", total);
        }
    }
}
