use std::io::{self, Write};
use std::time::{Duration, Instant};

const UPDATE_INTERVAL: Duration = Duration::from_secs(1);
const BYTES_PER_MEGABYTE: f64 = 1_000_000.0;
const CLEAR_LINE: &str = "\r\x1b[K";

/// Lets an update through at most once per interval.
#[derive(Debug, Clone)]
struct Throttle {
    interval: Duration,
    last: Instant,
}

impl Throttle {
    fn new(start: Instant, interval: Duration) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    fn ready(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) < self.interval {
            return false;
        }
        self.last = now;
        true
    }
}

/// In-place byte progress for a single file copy.
pub struct FileProgress<W: Write> {
    out: W,
    started: Instant,
    throttle: Throttle,
    shown: bool,
    finished: bool,
}

impl FileProgress<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr(), Instant::now())
    }
}

impl<W: Write> FileProgress<W> {
    pub fn new(out: W, started: Instant) -> Self {
        Self {
            out,
            started,
            throttle: Throttle::new(started, UPDATE_INTERVAL),
            shown: false,
            finished: false,
        }
    }

    pub fn update(&mut self, transferred: u64, total: u64) {
        self.update_at(transferred, total, Instant::now());
    }

    pub fn update_at(&mut self, transferred: u64, total: u64, now: Instant) {
        if self.finished {
            return;
        }

        if transferred >= total {
            self.finished = true;
            // a file that finished before the first tick never shows a line
            if self.shown {
                self.write_line(transferred, total, now);
                let _ = writeln!(self.out);
                let _ = self.out.flush();
            }
            return;
        }

        if self.throttle.ready(now) {
            self.write_line(transferred, total, now);
            self.shown = true;
        }
    }

    fn write_line(&mut self, transferred: u64, total: u64, now: Instant) {
        let elapsed = now
            .saturating_duration_since(self.started)
            .as_secs_f64()
            .max(1.0);
        let rate = transferred as f64 / elapsed;
        let _ = write!(
            self.out,
            "{CLEAR_LINE}Transferred {:.2} MB out of {:.2} MB ({:.2} MB/s)",
            transferred as f64 / BYTES_PER_MEGABYTE,
            total as f64 / BYTES_PER_MEGABYTE,
            rate / BYTES_PER_MEGABYTE,
        );
        let _ = self.out.flush();
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

/// Overall progress of a run: directories still queued and files examined so far.
pub struct OperationProgress<W: Write> {
    out: W,
    throttle: Throttle,
}

impl OperationProgress<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr(), Instant::now())
    }
}

impl<W: Write> OperationProgress<W> {
    pub fn new(out: W, started: Instant) -> Self {
        Self {
            out,
            throttle: Throttle::new(started, UPDATE_INTERVAL),
        }
    }

    pub fn tick(&mut self, dirs_remaining: usize, files_done: u64) {
        self.tick_at(dirs_remaining, files_done, Instant::now());
    }

    pub fn tick_at(&mut self, dirs_remaining: usize, files_done: u64, now: Instant) {
        if self.throttle.ready(now) {
            self.show(dirs_remaining, files_done);
        }
    }

    pub fn finish(&mut self, files_done: u64) {
        self.show(0, files_done);
    }

    fn show(&mut self, dirs_remaining: usize, files_done: u64) {
        let _ = writeln!(
            self.out,
            "Progress: {dirs_remaining} dirs remaining, synced {files_done} files"
        );
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
