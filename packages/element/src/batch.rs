//! Per-kind batching state machine.
//!
//! `Idle --try_schedule--> Scheduled --settle--> Idle`. The first mutation of
//! a kind schedules one deferred unit of work; later mutations are absorbed
//! into the pending payload until that unit settles the batch.

use webcell_expression::{Object, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Scheduled,
}

#[derive(Debug, Default)]
pub struct Batch {
    state: BatchState,
    pending: Object,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn is_scheduled(&self) -> bool {
        self.state == BatchState::Scheduled
    }

    /// True when the caller must queue the unit of work.
    pub fn try_schedule(&mut self) -> bool {
        match self.state {
            BatchState::Idle => {
                self.state = BatchState::Scheduled;
                true
            }
            BatchState::Scheduled => false,
        }
    }

    /// Record a value (last write wins) and schedule if idle.
    pub fn absorb(&mut self, name: &str, value: Value) -> bool {
        self.pending.insert(name.to_string(), value);
        self.try_schedule()
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.contains_key(name)
    }

    /// Back to idle; returns the absorbed payload.
    pub fn settle(&mut self) -> Object {
        self.state = BatchState::Idle;
        std::mem::take(&mut self.pending)
    }

    /// Drop the payload and return to idle without running.
    pub fn reset(&mut self) {
        self.state = BatchState::Idle;
        self.pending.clear();
    }
}
