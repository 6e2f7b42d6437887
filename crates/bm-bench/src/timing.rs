use std::fmt;
use std::time::{Duration, Instant};

/// Run `f` and return its output together with the wall-clock time it took.
pub fn timed<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

/// Outcome of timing one multiplication strategy.
#[derive(Debug, Clone)]
pub struct Timing {
    pub name: String,
    pub elapsed: Duration,
    /// Largest absolute deviation from the reference product.
    pub max_abs_diff: f32,
}

impl Timing {
    pub fn millis(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1e3
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} {:>12.3} ms   max |diff| {:e}",
            self.name,
            self.millis(),
            self.max_abs_diff
        )
    }
}
