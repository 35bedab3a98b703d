use super::state::State;
use crate::report;
use crate::Error;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

type Predicate = Box<dyn FnMut() -> bool + Send + Sync>;

/// shared bookkeeping for a cooperative long-running engine. engines embed
/// one of these and poll `stopped()` from their inner loops; the kill flag
/// is shared through an Arc so a race can request abandonment from another
/// thread while the engine is being driven.
pub struct Runner {
    name: &'static str,
    state: State,
    dead: Arc<AtomicBool>,
    started_at: Option<Instant>,
    deadline: Option<Instant>,
    predicate: Option<Predicate>,
    timed_out: bool,
    predicate_fired: bool,
    error: Option<Error>,
    report_every: Duration,
    last_report: Option<Instant>,
}

impl Runner {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: State::NeverRun,
            dead: Arc::new(AtomicBool::new(false)),
            started_at: None,
            deadline: None,
            predicate: None,
            timed_out: false,
            predicate_fired: false,
            error: None,
            report_every: Duration::from_secs(1),
            last_report: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// the state as last settled; a pending kill of an idle runner
    /// shows up as Dead here without waiting for the next drive.
    pub fn state(&self) -> State {
        if self.error.is_some() {
            State::NotRunningAfterError
        } else if self.dead() && !self.state.running() && self.state != State::Finished {
            State::Dead
        } else {
            self.state
        }
    }

    pub fn dead(&self) -> bool {
        self.dead.load(Ordering::Relaxed)
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out || self.state == State::TimedOut
    }

    pub fn stopped_by_predicate(&self) -> bool {
        self.predicate_fired || self.state == State::StoppedByPredicate
    }

    pub fn started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// request permanent abandonment. idempotent; reset only by init().
    pub fn kill(&mut self) {
        self.dead.store(true, Ordering::Relaxed);
    }

    /// handle with which another thread can kill this runner
    pub fn kill_token(&self) -> Arc<AtomicBool> {
        self.dead.clone()
    }

    pub fn report_every(&mut self, every: Duration) {
        self.report_every = every;
    }

    /// forget any previous death or captured error so the engine can be
    /// driven again from whatever state its own data is in
    pub fn init(&mut self) {
        self.state = State::NeverRun;
        self.dead.store(false, Ordering::Relaxed);
        self.started_at = None;
        self.deadline = None;
        self.predicate = None;
        self.timed_out = false;
        self.predicate_fired = false;
        self.error = None;
        self.last_report = None;
    }

    /// poll point for run_impl loops: true when the engine should yield.
    /// also the hook through which periodic progress lines are emitted.
    pub fn stopped(&mut self) -> bool {
        self.tick();
        if self.dead() {
            return true;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.timed_out = true;
                return true;
            }
        }
        if let Some(predicate) = self.predicate.as_mut() {
            if predicate() {
                self.predicate_fired = true;
                return true;
            }
        }
        false
    }

    fn tick(&mut self) {
        if !report::reporting() {
            return;
        }
        let due = self
            .last_report
            .is_none_or(|last| last.elapsed() >= self.report_every);
        if due {
            self.last_report = Some(Instant::now());
            if let Some(started) = self.started_at {
                log::info!(
                    "{}: running for {}",
                    self.name,
                    report::humane(started.elapsed())
                );
            }
        }
    }

    pub(super) fn begin(
        &mut self,
        state: State,
        timeout: Option<Duration>,
        predicate: Option<Predicate>,
    ) {
        let now = Instant::now();
        self.state = state;
        self.started_at = Some(now);
        self.deadline = timeout.map(|d| now + d);
        self.predicate = predicate;
        self.timed_out = false;
        self.predicate_fired = false;
        self.last_report = Some(now);
    }

    pub(super) fn settle(&mut self, outcome: crate::Result<()>, finished: bool) -> crate::Result<()> {
        self.deadline = None;
        self.predicate = None;
        match outcome {
            Err(e) => {
                self.error = Some(e.clone());
                self.state = State::NotRunningAfterError;
                Err(e)
            }
            Ok(()) => {
                self.state = if self.dead() {
                    State::Dead
                } else if finished {
                    State::Finished
                } else if self.timed_out {
                    State::TimedOut
                } else if self.predicate_fired {
                    State::StoppedByPredicate
                } else {
                    State::Finished
                };
                Ok(())
            }
        }
    }
}
