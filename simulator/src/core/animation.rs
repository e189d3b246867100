//! Replay state machine for one path.
//!
//! ```text
//! Idle --start--> Running(0) --tick--> Running(1) ... Running(len) --tick--> Done
//!  ^                                                                          |
//!  +------------------------------- cancel (from any state) ------------------+
//! ```
//!
//! `Running(i)` means `i` items have been activated. The tick that finds the
//! whole path activated moves to `Done` and clears `current`. `start` from any
//! state cancels first, so two runs never mix.

use serde::Serialize;

use crate::core::graph::PathDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running {
        cursor: usize,
    },
    Done,
}

/// Snapshot handed to the presentation layer after every tick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Frame {
    /// Ids activated so far this run, in path order.
    pub activated: Vec<String>,
    /// Most recent activation; `None` once the run completes.
    pub current: Option<String>,
}

impl Frame {
    pub fn is_active(&self, id: &str) -> bool {
        self.activated.iter().any(|activated| activated == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Activated(String),
    Finished,
    /// Tick arrived while idle or done; nothing changed.
    Inactive,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    sequence: Vec<String>,
    phase: Phase,
    activated: Vec<String>,
    current: Option<String>,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, path: &PathDefinition) {
        self.cancel();
        self.sequence = path.ids().to_vec();
        self.phase = Phase::Running { cursor: 0 };
    }

    /// Return to `Idle`, dropping all progress. Idempotent.
    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
        self.sequence.clear();
        self.activated.clear();
        self.current = None;
    }

    pub fn tick(&mut self) -> TickOutcome {
        let Phase::Running { cursor } = self.phase else {
            return TickOutcome::Inactive;
        };
        match self.sequence.get(cursor) {
            Some(id) => {
                self.activated.push(id.clone());
                self.current = Some(id.clone());
                self.phase = Phase::Running { cursor: cursor + 1 };
                TickOutcome::Activated(id.clone())
            }
            None => {
                self.current = None;
                self.phase = Phase::Done;
                TickOutcome::Finished
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub fn activated(&self) -> &[String] {
        &self.activated
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn frame(&self) -> Frame {
        Frame {
            activated: self.activated.clone(),
            current: self.current.clone(),
        }
    }
}
