use std::{
    io::Write,
    time::{Duration, Instant},
};

use crate::common::Result;

const NANOS_PER_TICK: u128 = 100;
const TICKS_PER_SECOND: u128 = 10_000_000;
const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub label: String,
    pub elapsed: Duration,
}

/// Single monotonic stopwatch. Elapsed time is cumulative and never reset.
pub struct Reporter<W: Write> {
    out: W,
    started: Option<Instant>,
    checkpoints: Vec<Checkpoint>,
}

impl<W: Write> Reporter<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out,
            started: None,
            checkpoints: vec![],
        }
    }

    /// Starts the stopwatch. Later calls keep the first start.
    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started
            .map_or(Duration::ZERO, |started| started.elapsed())
    }

    /// Prints `label=elapsed`.
    ///
    /// # Errors
    ///
    /// On write failure.
    pub fn checkpoint(&mut self, label: &str) -> Result<Duration> {
        let elapsed = self.elapsed();
        writeln!(self.out, "{label}={}", format_elapsed(elapsed))?;
        self.out.flush()?;

        self.checkpoints.push(Checkpoint {
            label: label.into(),
            elapsed,
        });
        Ok(elapsed)
    }

    /// Prints the final row count with the cumulative time.
    ///
    /// # Errors
    ///
    /// On write failure.
    pub fn count(&mut self, count: u64) -> Result<Duration> {
        let elapsed = self.elapsed();
        writeln!(self.out, "Count={count}\tTime={}", format_elapsed(elapsed))?;
        self.out.flush()?;
        Ok(elapsed)
    }

    #[must_use]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// `[d.]hh:mm:ss[.fffffff]` with 100ns ticks.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let ticks = elapsed.as_nanos() / NANOS_PER_TICK % TICKS_PER_SECOND;
    let total_seconds = elapsed.as_secs();

    let days = total_seconds / SECONDS_PER_DAY;
    let hours = total_seconds % SECONDS_PER_DAY / 3600;
    let minutes = total_seconds % 3600 / 60;
    let seconds = total_seconds % 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if ticks > 0 {
        out.push_str(&format!(".{ticks:07}"));
    }
    out
}
