//! Scan-in-progress state for repeated cycles
//!
//! The watch loop asks the gate for permission before starting a cycle.
//! While a [`CycleGuard`] is alive the gate reports `Running` and refuses
//! further cycles; dropping the guard (normally or by unwinding) returns it
//! to `Idle`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Default)]
pub struct CycleGate {
    running: Arc<AtomicBool>,
}

impl CycleGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CycleState {
        if self.running.load(Ordering::Acquire) {
            CycleState::Running
        } else {
            CycleState::Idle
        }
    }

    /// Move to `Running` unless a cycle is already in progress.
    pub fn try_begin(&self) -> Option<CycleGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                running: Arc::clone(&self.running),
            })
    }
}

/// Held for the duration of one cycle
#[derive(Debug)]
pub struct CycleGuard {
    running: Arc<AtomicBool>,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
