//! Idle-timeout state machine.
//!
//! DESIGN
//! ======
//! Three phases: `Active` (timer armed), `Prompting` (idle prompt visible,
//! interaction ignored) and `LoggedOut` (terminal for this session; a new
//! login starts the machine over).
//!
//! The monitor owns exactly one timer handle. Arming aborts the previous
//! handle and schedules the next one in the same call, and every arm bumps an
//! epoch. A firing carries the epoch it was armed with, so a timer that woke
//! up just as it was being replaced is recognized as stale and dropped.
//!
//! The monitor does not spawn anything itself: the session store passes a
//! `schedule` closure that turns an [`IdleTicket`] into a task.

#[cfg(test)]
#[path = "idle_test.rs"]
mod idle_test;

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdlePhase {
    Active,
    Prompting,
    #[default]
    LoggedOut,
}

/// One armed countdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdleTicket {
    pub epoch: u64,
    pub deadline: Instant,
}

/// Result of a timer firing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Elapsed {
    /// The prompt is now visible.
    Prompt,
    /// Identity was gone at fire time; no prompt, machine stops.
    NoIdentity,
    /// The firing belongs to a replaced or cancelled timer.
    Stale,
}

#[derive(Debug)]
pub struct IdleMonitor {
    phase: IdlePhase,
    timeout: Duration,
    epoch: u64,
    deadline: Option<Instant>,
    timer: Option<JoinHandle<()>>,
}

impl IdleMonitor {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { phase: IdlePhase::LoggedOut, timeout, epoch: 0, deadline: None, timer: None }
    }

    #[must_use]
    pub fn phase(&self) -> IdlePhase {
        self.phase
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn is_prompting(&self) -> bool {
        self.phase == IdlePhase::Prompting
    }

    /// When the pending timer fires, if one is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Begin a fresh session: enter `Active` and arm, whatever the prior phase.
    pub fn start<F>(&mut self, now: Instant, schedule: F) -> IdleTicket
    where
        F: FnOnce(IdleTicket) -> JoinHandle<()>,
    {
        self.phase = IdlePhase::Active;
        self.arm(now, schedule)
    }

    /// Interaction signal. Restarts the countdown only while `Active`.
    pub fn record_activity<F>(&mut self, now: Instant, schedule: F) -> Option<IdleTicket>
    where
        F: FnOnce(IdleTicket) -> JoinHandle<()>,
    {
        match self.phase {
            IdlePhase::Active => Some(self.arm(now, schedule)),
            IdlePhase::Prompting | IdlePhase::LoggedOut => None,
        }
    }

    /// The user chose to continue from the prompt.
    pub fn resume<F>(&mut self, now: Instant, schedule: F) -> Option<IdleTicket>
    where
        F: FnOnce(IdleTicket) -> JoinHandle<()>,
    {
        match self.phase {
            IdlePhase::Prompting => {
                self.phase = IdlePhase::Active;
                Some(self.arm(now, schedule))
            }
            IdlePhase::Active | IdlePhase::LoggedOut => None,
        }
    }

    /// Timer callback. `identity_present` is sampled at fire time.
    pub fn elapsed(&mut self, epoch: u64, identity_present: bool) -> Elapsed {
        if epoch != self.epoch || self.phase != IdlePhase::Active {
            return Elapsed::Stale;
        }
        // The firing task is the pending one and is finishing on its own.
        self.timer = None;
        self.deadline = None;
        if identity_present {
            self.phase = IdlePhase::Prompting;
            Elapsed::Prompt
        } else {
            self.phase = IdlePhase::LoggedOut;
            Elapsed::NoIdentity
        }
    }

    /// Enter `LoggedOut` and disarm.
    pub fn end(&mut self) {
        self.cancel();
        self.phase = IdlePhase::LoggedOut;
    }

    fn arm<F>(&mut self, now: Instant, schedule: F) -> IdleTicket
    where
        F: FnOnce(IdleTicket) -> JoinHandle<()>,
    {
        self.cancel();
        let ticket = IdleTicket { epoch: self.epoch, deadline: now + self.timeout };
        self.deadline = Some(ticket.deadline);
        self.timer = Some(schedule(ticket));
        ticket
    }

    /// Abort the pending timer and invalidate any firing already under way.
    fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.deadline = None;
        self.epoch = self.epoch.wrapping_add(1);
    }
}

impl Drop for IdleMonitor {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
