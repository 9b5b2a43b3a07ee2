//! Authoritative Timer Slot
//!
//! The engine keeps at most one armed timer. Arming always clears the
//! previous one first and both happen in the same call, so a stale
//! handle can never survive next to a fresh one. The host turns the
//! returned [`TimerCommand`]s into real timers and reports expiry back
//! with the [`TimerId`]; ids that are no longer current are ignored.

use serde::{Serialize, Deserialize};

/// Identifies one arming of the slot. Never reused within an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// What the timer is counting down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPurpose {
    /// Pre-game countdown
    Countdown,
    /// Answer window of the question at this index
    Question(usize),
}

/// The currently armed timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmedTimer {
    /// Timer identity
    pub id: TimerId,
    /// What expiry means
    pub purpose: TimerPurpose,
    /// Absolute expiry time
    pub deadline_ms: u64,
}

/// Instruction for the host's timer facility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TimerCommand {
    /// Start a timer that reports `id` after `delay_ms`.
    Arm {
        /// Timer identity
        id: TimerId,
        /// Delay from now
        delay_ms: u64,
    },
    /// Drop the timer with this id if still pending.
    Cancel {
        /// Timer identity
        id: TimerId,
    },
}

/// Single slot holding the one live timer.
#[derive(Clone, Debug, Default)]
pub struct TimerSlot {
    armed: Option<ArmedTimer>,
    next_id: u64,
}

impl TimerSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear any armed timer, then arm a new one.
    pub fn arm(
        &mut self,
        purpose: TimerPurpose,
        now_ms: u64,
        delay_ms: u64,
        commands: &mut Vec<TimerCommand>,
    ) -> TimerId {
        if let Some(cancel) = self.clear() {
            commands.push(cancel);
        }

        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.armed = Some(ArmedTimer {
            id,
            purpose,
            deadline_ms: now_ms.saturating_add(delay_ms),
        });
        commands.push(TimerCommand::Arm { id, delay_ms });
        id
    }

    /// Empty the slot, returning the cancel command for the old timer.
    pub fn clear(&mut self) -> Option<TimerCommand> {
        self.armed.take().map(|t| TimerCommand::Cancel { id: t.id })
    }

    /// Remove and return the armed timer if `id` is the live one.
    pub fn take_if_current(&mut self, id: TimerId) -> Option<ArmedTimer> {
        match self.armed {
            Some(t) if t.id == id => self.armed.take(),
            _ => None,
        }
    }

    /// Is `id` the live timer?
    pub fn is_current(&self, id: TimerId) -> bool {
        self.armed.is_some_and(|t| t.id == id)
    }

    /// The live timer, if any.
    pub fn current(&self) -> Option<&ArmedTimer> {
        self.armed.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_clears_previous() {
        let mut slot = TimerSlot::new();
        let mut commands = Vec::new();

        let first = slot.arm(TimerPurpose::Question(0), 0, 6000, &mut commands);
        let second = slot.arm(TimerPurpose::Question(1), 6000, 6000, &mut commands);

        assert_ne!(first, second);
        assert_eq!(
            commands,
            vec![
                TimerCommand::Arm { id: first, delay_ms: 6000 },
                TimerCommand::Cancel { id: first },
                TimerCommand::Arm { id: second, delay_ms: 6000 },
            ]
        );
        assert!(slot.is_current(second));
        assert!(!slot.is_current(first));
        assert_eq!(slot.current().map(|t| t.deadline_ms), Some(12000));
    }

    #[test]
    fn test_take_if_current_ignores_stale() {
        let mut slot = TimerSlot::new();
        let mut commands = Vec::new();
        let first = slot.arm(TimerPurpose::Countdown, 0, 3000, &mut commands);
        let second = slot.arm(TimerPurpose::Question(0), 3000, 6000, &mut commands);

        assert_eq!(slot.take_if_current(first), None);
        let taken = slot.take_if_current(second);
        assert_eq!(taken.map(|t| t.purpose), Some(TimerPurpose::Question(0)));
        assert!(slot.current().is_none());
        assert_eq!(slot.clear(), None);
    }
}
