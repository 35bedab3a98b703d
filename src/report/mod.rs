use std::cell::RefCell;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

thread_local! {
    static GUARDS: RefCell<Vec<bool>> = const { RefCell::new(Vec::new()) };
}

/// whether progress reporting is enabled in the current scope.
/// defaults to quiet until a ReportGuard turns it on.
pub fn reporting() -> bool {
    GUARDS.with(|stack| *stack.borrow().last().unwrap_or(&false))
}

/// scoped switch for progress reporting. engines consult the innermost
/// guard on the current thread before emitting anything.
pub struct ReportGuard(());

impl ReportGuard {
    pub fn new(on: bool) -> Self {
        GUARDS.with(|stack| stack.borrow_mut().push(on));
        Self(())
    }
}

impl Drop for ReportGuard {
    fn drop(&mut self) {
        GUARDS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// background callback fired at a fixed minimum interval for as long as
/// the ticker is in scope. the thread is stopped and joined on drop.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    const POLL: Duration = Duration::from_millis(25);

    pub fn new<F>(every: Duration, mut f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = std::thread::spawn(move || {
            let mut last = Instant::now();
            while !flag.load(Ordering::Relaxed) {
                std::thread::sleep(Self::POLL.min(every));
                if last.elapsed() >= every {
                    last = Instant::now();
                    f();
                }
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.join().expect("join ticker thread");
        }
    }
}

// unit boundaries in nanoseconds, largest first
const UNITS: &[(u128, &str)] = &[
    (31_557_600_000_000_000, "yr"),
    (2_629_800_000_000_000, "mon"),
    (604_800_000_000_000, "wk"),
    (86_400_000_000_000, "d"),
    (3_600_000_000_000, "h"),
    (60_000_000_000, "min"),
    (1_000_000_000, "s"),
    (1_000_000, "ms"),
    (1_000, "us"),
    (1, "ns"),
];

/// render a duration in the largest unit that keeps the leading
/// component at least 1, e.g. "1.50min" rather than "90.00s".
pub fn humane(elapsed: Duration) -> String {
    let nanos = elapsed.as_nanos();
    for (scale, unit) in UNITS {
        if nanos >= *scale {
            return format!("{:.2}{}", nanos as f64 / *scale as f64, unit);
        }
    }
    "0ns".to_string()
}

/// initialize terminal logging, for binaries, benches, and examples
pub fn init() {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let _ = simplelog::TermLogger::init(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn guards_nest() {
        assert!(!reporting());
        {
            let _outer = ReportGuard::new(true);
            assert!(reporting());
            {
                let _inner = ReportGuard::new(false);
                assert!(!reporting());
            }
            assert!(reporting());
        }
        assert!(!reporting());
    }

    #[test]
    fn ticker_fires_and_stops() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        {
            let _ticker = Ticker::new(Duration::from_millis(5), move || {
                seen.fetch_add(1, Ordering::Relaxed);
            });
            std::thread::sleep(Duration::from_millis(60));
        }
        let fired = count.load(Ordering::Relaxed);
        assert!(fired >= 1);
        std::thread::sleep(Duration::from_millis(30));
        assert!(count.load(Ordering::Relaxed) == fired);
    }

    #[test]
    fn humane_units() {
        assert!(humane(Duration::from_nanos(12)) == "12.00ns");
        assert!(humane(Duration::from_micros(3)) == "3.00us");
        assert!(humane(Duration::from_millis(1500)) == "1.50s");
        assert!(humane(Duration::from_secs(90)) == "1.50min");
        assert!(humane(Duration::from_secs(7200)) == "2.00h");
        assert!(humane(Duration::from_secs(86400 * 14)) == "2.00wk");
    }
}
