//! Per-turn state machine
//!
//! ```text
//! Idle -> Classifying -> Clarifying -> Complete
//!                     -> Planning -> Executing -> Normalizing -> Complete
//!                                             -> FallingBack -> Complete
//! ```
//!
//! Quick-start tags skip classification: `Idle -> Planning`. A clarification
//! that the caller acts on anyway continues `Clarifying -> Planning`.
//! `Complete` is terminal; each turn gets a fresh tracker.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    Classifying,
    Clarifying,
    Planning,
    Executing,
    Normalizing,
    FallingBack,
    Complete,
}

impl TurnPhase {
    pub fn can_transition_to(self, next: TurnPhase) -> bool {
        use TurnPhase::*;
        matches!(
            (self, next),
            (Idle, Classifying)
                | (Idle, Planning)
                | (Classifying, Clarifying)
                | (Classifying, Planning)
                | (Clarifying, Planning)
                | (Clarifying, Complete)
                | (Planning, Executing)
                | (Executing, Normalizing)
                | (Executing, FallingBack)
                | (Normalizing, Complete)
                | (FallingBack, Complete)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == TurnPhase::Complete
    }
}

/// Records the phases one turn passes through
#[derive(Debug, Clone)]
pub struct TurnTracker {
    path: Vec<TurnPhase>,
}

impl Default for TurnTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnTracker {
    pub fn new() -> Self {
        Self {
            path: vec![TurnPhase::Idle],
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.path.last().copied().unwrap_or(TurnPhase::Idle)
    }

    /// Move to `next`; an illegal transition is logged and ignored
    pub fn advance(&mut self, next: TurnPhase) -> bool {
        let current = self.phase();
        if !current.can_transition_to(next) {
            tracing::warn!(from = ?current, to = ?next, "Illegal turn transition ignored");
            return false;
        }
        tracing::debug!(from = ?current, to = ?next, "Turn transition");
        self.path.push(next);
        true
    }

    pub fn path(&self) -> &[TurnPhase] {
        &self.path
    }

    pub fn fell_back(&self) -> bool {
        self.path.contains(&TurnPhase::FallingBack)
    }
}
