use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation token shared by the engine and every query it
/// runs. Row loops poll it between pulls; nothing is ever preempted.
#[derive(Debug, Clone, Default)]
pub struct ExecutionState {
    interrupted: Arc<AtomicBool>,
}

impl ExecutionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.interrupted.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}
