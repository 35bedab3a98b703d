/// lifecycle of a long-running engine. the running states record how the
/// current drive was requested so that the terminal state can be chosen
/// when the drive yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    NeverRun,
    RunningToFinish,
    RunningFor,
    RunningUntil,
    StoppedByPredicate,
    TimedOut,
    Dead,
    Finished,
    NotRunningAfterError,
}

impl State {
    pub fn running(&self) -> bool {
        matches!(
            self,
            Self::RunningToFinish | Self::RunningFor | Self::RunningUntil
        )
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NeverRun => write!(f, "never run"),
            Self::RunningToFinish => write!(f, "running to finish"),
            Self::RunningFor => write!(f, "running for"),
            Self::RunningUntil => write!(f, "running until"),
            Self::StoppedByPredicate => write!(f, "stopped by predicate"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Dead => write!(f, "dead"),
            Self::Finished => write!(f, "finished"),
            Self::NotRunningAfterError => write!(f, "not running after error"),
        }
    }
}
