use crate::runner::Run;
use crate::Result;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

/// runs several engines against the same problem on parallel threads
/// and keeps the first to finish. runners are shared handles, so the
/// caller can keep a typed handle to each engine and query the losers
/// afterwards; each runner is driven by exactly one thread, and the
/// only cross-thread communication is the kill flag every loser
/// listens to.
pub struct Race {
    runners: Vec<Arc<Mutex<dyn Run>>>,
    max_threads: usize,
    winner: Option<usize>,
}

impl Default for Race {
    fn default() -> Self {
        Self::new()
    }
}

impl Race {
    pub fn new() -> Self {
        Self {
            runners: Vec::new(),
            max_threads: num_cpus::get(),
            winner: None,
        }
    }

    /// cap on simultaneously driven runners; surplus runners sit out
    pub fn max_threads(&mut self, n: usize) -> &mut Self {
        self.max_threads = n.max(1);
        self
    }

    pub fn add(&mut self, runner: Arc<Mutex<dyn Run>>) -> &mut Self {
        self.runners.push(runner);
        self
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    pub fn winner_index(&self) -> Option<usize> {
        self.winner
    }

    pub fn winner(&self) -> Option<Arc<Mutex<dyn Run>>> {
        self.winner.map(|i| self.runners[i].clone())
    }

    /// drive until some runner finishes
    pub fn run(&mut self) -> Result<()> {
        self.race(None, None)
    }

    /// drive for at most `budget`; losers and non-finishers are killed
    pub fn run_for(&mut self, budget: Duration) -> Result<()> {
        self.race(Some(budget), None)
    }

    /// drive until some runner finishes or the predicate fires
    pub fn run_until(&mut self, predicate: Arc<dyn Fn() -> bool + Send + Sync>) -> Result<()> {
        self.race(None, Some(predicate))
    }

    fn race(
        &mut self,
        budget: Option<Duration>,
        predicate: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
    ) -> Result<()> {
        if self.runners.is_empty() {
            return Ok(());
        }
        let count = self.runners.len().min(self.max_threads);
        let tokens = self
            .runners
            .iter()
            .map(|r| r.lock().expect("runner mutex").runner().kill_token())
            .collect::<Vec<_>>();
        let first = AtomicUsize::new(usize::MAX);
        std::thread::scope(|scope| {
            for (i, shared) in self.runners.iter().take(count).enumerate() {
                let shared = shared.clone();
                let tokens = &tokens;
                let first = &first;
                let predicate = predicate.clone();
                scope.spawn(move || {
                    let mut runner = shared.lock().expect("runner mutex");
                    let outcome = match (budget, predicate) {
                        (Some(d), _) => runner.run_for(d),
                        (None, Some(p)) => runner.run_until(Box::new(move || p())),
                        (None, None) => runner.run(),
                    };
                    // failures surface through the runner's own state
                    let _ = outcome;
                    if runner.finished()
                        && first
                            .compare_exchange(usize::MAX, i, Ordering::SeqCst, Ordering::SeqCst)
                            .is_ok()
                    {
                        for (j, token) in tokens.iter().enumerate() {
                            if j != i {
                                token.store(true, Ordering::SeqCst);
                            }
                        }
                    }
                });
            }
        });
        self.winner = match first.load(Ordering::SeqCst) {
            usize::MAX => None,
            index => Some(index),
        };
        if self.winner.is_none() {
            for token in tokens.iter() {
                token.store(true, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}
