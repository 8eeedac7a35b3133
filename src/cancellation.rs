//! Query cancellation.
//!
//! Cancelling a query must stop dispatching new batches, let in-flight
//! batches finish or abort at their next block-read boundary, and never
//! leave partial results visible to the caller. A [`CancellationToken`]
//! is checked before each batch's block read; once set, in-flight batches
//! skip their read and return no candidates, and the engine reports the
//! query as cancelled rather than returning whatever happened to finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative, shareable cancellation flag for one in-flight query.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    /// Requests cancellation. Safe to call from any thread, any number of
    /// times.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
