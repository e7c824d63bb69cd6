//! Whole-pipeline restarts with a fixed, shrinking-delay schedule.
//!
//! The supervisor never exits the process. It reports a terminal
//! [`RunOutcome`] and the binary turns that into an exit status.

use anyhow::Error;
use std::time::Duration;

/// Blocks between attempts. Swapped out in tests to record delays.
pub trait Sleeper {
    fn sleep(&mut self, d: Duration);
}

/// Real wall-clock sleeping.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, d: Duration) {
        std::thread::sleep(d);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupervisorState {
    Running { attempt: u32 },
    RetryWait { attempt: u32, delay: Duration },
    Success { attempts: u32 },
    Failed { attempts: u32 },
}

impl SupervisorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SupervisorState::Success { .. } | SupervisorState::Failed { .. })
    }
}

#[derive(Debug)]
pub enum RunOutcome<T> {
    Succeeded { value: T, attempts: u32, waits: Vec<Duration> },
    Exhausted { attempts: u32, waits: Vec<Duration>, last_error: Error },
}

impl<T> RunOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RunOutcome::Succeeded { attempts, .. } | RunOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn waits(&self) -> &[Duration] {
        match self {
            RunOutcome::Succeeded { waits, .. } | RunOutcome::Exhausted { waits, .. } => waits,
        }
    }

    /// 0 on success, 1 once the restart budget is spent.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// Bounded restart loop. The budget is the schedule length; delays are taken
/// from the back of the schedule, so the first restart uses its last entry.
#[derive(Clone, Debug)]
pub struct Supervisor {
    schedule: Vec<Duration>,
    state: SupervisorState,
}

impl Supervisor {
    pub fn new(schedule: Vec<Duration>) -> Self {
        Self { schedule, state: SupervisorState::Running { attempt: 1 } }
    }

    pub fn from_secs(secs: &[u64]) -> Self {
        Self::new(secs.iter().map(|s| Duration::from_secs(*s)).collect())
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn retries_left(&self) -> usize {
        self.schedule.len()
    }

    /// Feed the result of the current attempt and advance the state machine.
    /// Returns the delay to wait before the next attempt, or `None` once terminal.
    pub fn on_result(&mut self, ok: bool) -> Option<Duration> {
        let attempt = match self.state {
            SupervisorState::Running { attempt } => attempt,
            _ => return None,
        };
        if ok {
            self.state = SupervisorState::Success { attempts: attempt };
            return None;
        }
        match self.schedule.pop() {
            Some(delay) => {
                self.state = SupervisorState::RetryWait { attempt, delay };
                Some(delay)
            }
            None => {
                self.state = SupervisorState::Failed { attempts: attempt };
                None
            }
        }
    }

    /// Leave `RetryWait` for the next attempt.
    pub fn resume(&mut self) {
        if let SupervisorState::RetryWait { attempt, .. } = self.state {
            self.state = SupervisorState::Running { attempt: attempt + 1 };
        }
    }

    /// Run `attempt` until it succeeds or the schedule is exhausted.
    pub fn run<T>(
        mut self,
        sleeper: &mut dyn Sleeper,
        mut attempt: impl FnMut(u32) -> anyhow::Result<T>,
    ) -> RunOutcome<T> {
        let mut waits = Vec::new();
        let mut n = 1u32;
        loop {
            match attempt(n) {
                Ok(value) => {
                    self.on_result(true);
                    return RunOutcome::Succeeded { value, attempts: n, waits };
                }
                Err(e) => {
                    tracing::error!("Attempt {} failed: {:?}", n, e);
                    match self.on_result(false) {
                        Some(delay) => {
                            tracing::warn!("Restarting after {} seconds", delay.as_secs());
                            sleeper.sleep(delay);
                            waits.push(delay);
                            self.resume();
                            n += 1;
                        }
                        None => {
                            tracing::error!("Too many restarts. Aborting");
                            return RunOutcome::Exhausted { attempts: n, waits, last_error: e };
                        }
                    }
                }
            }
        }
    }
}
