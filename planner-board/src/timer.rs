//! Focus timer attached to one card at a time.
//!
//! The timer lives in a [`TimerStore`]: it is created on first activation
//! and dropped on close. Nothing here reads a clock; the owner calls
//! [`TimerStore::tick`] with the elapsed time.

use crate::types::CardId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub const fn duration(self) -> Duration {
        match self {
            Self::Focus => Duration::from_secs(25 * 60),
            Self::ShortBreak => Duration::from_secs(5 * 60),
            Self::LongBreak => Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusTimer {
    pub active_card: CardId,
    pub remaining: Duration,
    pub running: bool,
    pub phase: Phase,
}

impl FocusTimer {
    fn new(card: CardId) -> Self {
        let phase = Phase::default();
        Self {
            active_card: card,
            remaining: phase.duration(),
            running: false,
            phase,
        }
    }
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No timer, or the timer is paused
    Idle,
    Running { remaining: Duration },
    /// Reached zero on this tick; the timer is now stopped
    Finished,
}

#[derive(Debug, Clone, Default)]
pub struct TimerStore {
    timer: Option<FocusTimer>,
}

impl TimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&FocusTimer> {
        self.timer.as_ref()
    }

    /// Attach the timer to a card, creating it on first use
    pub fn activate(&mut self, card: CardId) -> &FocusTimer {
        let timer = self.timer.get_or_insert_with(|| {
            debug!(card = %card, "focus timer created");
            FocusTimer::new(card.clone())
        });
        timer.active_card = card;
        timer
    }

    pub fn start(&mut self) -> Option<&FocusTimer> {
        self.update(|t| t.running = true)
    }

    pub fn pause(&mut self) -> Option<&FocusTimer> {
        self.update(|t| t.running = false)
    }

    /// Count down by `elapsed`, stopping at zero
    pub fn tick(&mut self, elapsed: Duration) -> Tick {
        let Some(timer) = self.timer.as_mut().filter(|t| t.running) else {
            return Tick::Idle;
        };
        timer.remaining = timer.remaining.saturating_sub(elapsed);
        if timer.remaining.is_zero() {
            timer.running = false;
            debug!(card = %timer.active_card, phase = ?timer.phase, "focus timer finished");
            return Tick::Finished;
        }
        Tick::Running {
            remaining: timer.remaining,
        }
    }

    /// Set the remaining time and pause
    pub fn reset(&mut self, remaining: Duration) -> Option<&FocusTimer> {
        self.update(|t| {
            t.remaining = remaining;
            t.running = false;
        })
    }

    /// Switch phase; remaining becomes the phase duration and the timer pauses
    pub fn set_phase(&mut self, phase: Phase) -> Option<&FocusTimer> {
        self.update(|t| {
            t.phase = phase;
            t.remaining = phase.duration();
            t.running = false;
        })
    }

    /// Tear the timer down
    pub fn close(&mut self) -> Option<FocusTimer> {
        self.timer.take()
    }

    fn update(&mut self, f: impl FnOnce(&mut FocusTimer)) -> Option<&FocusTimer> {
        let timer = self.timer.as_mut()?;
        f(timer);
        Some(timer)
    }
}
