pub mod runner;
pub mod state;

pub use runner::Runner;
pub use state::State;

use crate::Result;
use std::time::Duration;

/// a cooperative long-running engine. implementors supply `run_impl`,
/// which must poll `self.runner_mut().stopped()` at a bounded step count
/// and return when it fires; everything else is provided. the trait is
/// object safe so a race can own a mixed collection of engines.
pub trait Run: Send {
    fn runner(&self) -> &Runner;
    fn runner_mut(&mut self) -> &mut Runner;
    fn run_impl(&mut self) -> Result<()>;
    fn finished_impl(&self) -> bool;

    /// drive to completion
    fn run(&mut self) -> Result<()> {
        self.drive(State::RunningToFinish, None, None)
    }

    /// drive until finished or the wall clock budget is spent
    fn run_for(&mut self, budget: Duration) -> Result<()> {
        self.drive(State::RunningFor, Some(budget), None)
    }

    /// drive until finished or the predicate fires
    fn run_until(&mut self, predicate: Box<dyn FnMut() -> bool + Send + Sync>) -> Result<()> {
        self.drive(State::RunningUntil, None, Some(predicate))
    }

    #[doc(hidden)]
    fn drive(
        &mut self,
        state: State,
        timeout: Option<Duration>,
        predicate: Option<Box<dyn FnMut() -> bool + Send + Sync>>,
    ) -> Result<()> {
        if let Some(error) = self.runner().error() {
            return Err(error.clone());
        }
        if self.finished_impl() {
            self.runner_mut().begin(state, None, None);
            return self.runner_mut().settle(Ok(()), true);
        }
        if self.runner().dead() {
            return Ok(());
        }
        self.runner_mut().begin(state, timeout, predicate);
        let outcome = self.run_impl();
        let finished = self.finished_impl();
        self.runner_mut().settle(outcome, finished)
    }

    /// request permanent abandonment; sticky until init()
    fn kill(&mut self) {
        self.runner_mut().kill();
    }

    /// forget death and captured errors so run_* may be called again
    fn init(&mut self) {
        self.runner_mut().init();
    }

    fn report_every(&mut self, every: Duration) {
        self.runner_mut().report_every(every);
    }

    fn current_state(&self) -> State {
        self.runner().state()
    }

    fn started(&self) -> bool {
        self.runner().started()
    }

    fn finished(&self) -> bool {
        !self.runner().dead() && self.runner().error().is_none() && self.finished_impl()
    }

    fn dead(&self) -> bool {
        self.runner().dead()
    }

    fn timed_out(&self) -> bool {
        self.runner().timed_out()
    }

    fn stopped_by_predicate(&self) -> bool {
        self.runner().stopped_by_predicate()
    }

    /// stopped for any reason other than completion
    fn stopped(&self) -> bool {
        self.dead() || self.timed_out() || self.stopped_by_predicate()
    }

    fn success(&self) -> bool {
        self.finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    /// counts to a target, one step per poll
    struct Counter {
        runner: Runner,
        count: usize,
        target: usize,
        fail_at: Option<usize>,
    }

    impl Counter {
        fn new(target: usize) -> Self {
            Self {
                runner: Runner::new("counter"),
                count: 0,
                target,
                fail_at: None,
            }
        }
    }

    impl Run for Counter {
        fn runner(&self) -> &Runner {
            &self.runner
        }
        fn runner_mut(&mut self) -> &mut Runner {
            &mut self.runner
        }
        fn finished_impl(&self) -> bool {
            self.count >= self.target
        }
        fn run_impl(&mut self) -> Result<()> {
            while !self.finished_impl() {
                if self.fail_at.is_some_and(|n| self.count >= n) {
                    return Err(Error::LimitExceeded {
                        what: "count",
                        limit: self.count,
                    });
                }
                self.count += 1;
                if self.runner.stopped() {
                    break;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn runs_to_finish() {
        let mut counter = Counter::new(100);
        assert!(counter.current_state() == State::NeverRun);
        assert!(!counter.started());
        counter.run().unwrap();
        assert!(counter.finished());
        assert!(counter.success());
        assert!(counter.count == 100);
        assert!(counter.current_state() == State::Finished);
    }

    #[test]
    fn run_until_predicate() {
        let mut counter = Counter::new(usize::MAX);
        counter.run_until(Box::new(|| true)).unwrap();
        assert!(counter.stopped_by_predicate());
        assert!(!counter.finished());
        assert!(counter.current_state() == State::StoppedByPredicate);
    }

    #[test]
    fn run_for_times_out() {
        let mut counter = Counter::new(usize::MAX);
        counter.run_for(Duration::from_millis(10)).unwrap();
        assert!(counter.timed_out());
        assert!(!counter.finished());
        assert!(counter.current_state() == State::TimedOut);
    }

    #[test]
    fn kill_is_permanent_until_init() {
        let mut counter = Counter::new(1000);
        counter.kill();
        counter.kill();
        assert!(counter.dead());
        counter.run().unwrap();
        assert!(counter.count == 0);
        assert!(counter.current_state() == State::Dead);
        counter.init();
        assert!(!counter.dead());
        counter.run().unwrap();
        assert!(counter.finished());
    }

    #[test]
    fn error_is_replayed_until_init() {
        let mut counter = Counter::new(10);
        counter.fail_at = Some(5);
        let first = counter.run().unwrap_err();
        assert!(counter.current_state() == State::NotRunningAfterError);
        let replay = counter.run().unwrap_err();
        assert!(first == replay);
        counter.init();
        counter.fail_at = None;
        counter.run().unwrap();
        assert!(counter.finished());
    }

    #[test]
    fn run_on_finished_is_a_noop() {
        let mut counter = Counter::new(3);
        counter.run().unwrap();
        counter.run().unwrap();
        assert!(counter.count == 3);
        assert!(counter.finished());
    }
}
