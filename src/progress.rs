//! Progress reporting.
//!
//! The engine feeds a [`Progress`] observer as it works: one
//! [`start`](Progress::start) call, incremental byte counts, queue
//! occupancy samples, and a final [`end`](Progress::end). The observer
//! never influences the sync.
//!
//! [`Tracker`] is the stock observer: it keeps a lock-guarded
//! [`Snapshot`] and hands it to a [`Render`] implementation on its own
//! timer (once per second by default), plus once more when the session
//! ends. With the `progress` feature, [`TerminalRender`] paints the
//! snapshot as a live report with indicatif.

use crossbeam_channel::{RecvTimeoutError, Sender};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Observer of a sync session.
///
/// All methods take `&self` and may be called from the coordinator and the
/// destination worker concurrently.
pub trait Progress: Send + Sync {
    /// The session is about to start comparing `size` bytes.
    fn start(&self, size: u64);

    /// `n` more source bytes were read and compared.
    fn read(&self, n: u64);

    /// `n` bytes were written explicitly to the destination.
    fn written(&self, n: u64);

    /// `n` bytes of the destination were turned into a hole.
    fn zeroed(&self, n: u64);

    /// Current occupancy of the three queues.
    fn queues(&self, _load: QueueLoad) {}

    /// The session is over. Blocks until any final report has been emitted.
    fn end(&self);
}

/// A [`Progress`] observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _size: u64) {}
    fn read(&self, _n: u64) {}
    fn written(&self, _n: u64) {}
    fn zeroed(&self, _n: u64) {}
    fn end(&self) {}
}

/// Number of queued items against the queue capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Occupancy {
    /// Items currently queued
    pub len: usize,
    /// Queue capacity
    pub capacity: usize,
}

impl Occupancy {
    /// Fill level as a whole percentage.
    pub fn percent(&self) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        100 * self.len / self.capacity
    }
}

/// Occupancy of the queues between the workers and the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueLoad {
    /// Blocks read from the source, not yet compared
    pub source_reads: Occupancy,
    /// Blocks read from the destination, not yet compared
    pub destination_reads: Occupancy,
    /// Blocks waiting to be written to the destination
    pub destination_writes: Occupancy,
}

/// Point-in-time view of a session's counters.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Length of the source file
    pub size: u64,
    /// Source bytes compared so far
    pub read: u64,
    /// Bytes written explicitly
    pub written: u64,
    /// Bytes turned into holes
    pub zeroed: u64,
    /// Latest queue sample
    pub queues: QueueLoad,
    /// Time since the session started
    pub elapsed: Duration,
}

impl Snapshot {
    /// Share of read bytes that had to be written, as a whole percentage.
    pub fn changes_percent(&self) -> u64 {
        if self.read == 0 {
            return 0;
        }
        100 * self.written / self.read
    }

    /// Read throughput in bytes per second.
    pub fn speed(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs < 1.0 {
            return 0;
        }
        (self.read as f64 / secs) as u64
    }

    /// Estimated time until the whole file has been read.
    pub fn estimated(&self) -> Duration {
        let speed = self.speed();
        if speed == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs(self.size.saturating_sub(self.read) / speed)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "file size              {}", format_bytes(self.size))?;
        writeln!(f)?;
        writeln!(f, "bytes read             {}", format_bytes(self.read))?;
        writeln!(f, "bytes written          {}", format_bytes(self.written))?;
        writeln!(f, "bytes zeroed           {}", format_bytes(self.zeroed))?;
        writeln!(f)?;
        writeln!(f, "read speed             {}/s", format_bytes(self.speed()))?;
        writeln!(f, "changed blocks         {:>3}%", self.changes_percent())?;
        writeln!(f)?;
        writeln!(
            f,
            "input read buffer      {:>3}%",
            self.queues.source_reads.percent()
        )?;
        writeln!(
            f,
            "output read buffer     {:>3}%",
            self.queues.destination_reads.percent()
        )?;
        writeln!(
            f,
            "output write buffer    {:>3}%",
            self.queues.destination_writes.percent()
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "time estimated         {}",
            format_duration(self.estimated())
        )?;
        write!(f, "time elapsed           {}", format_duration(self.elapsed))
    }
}

/// Something that displays snapshots.
pub trait Render: Send + 'static {
    /// Show `snapshot`. `last` is true for the final call of a session.
    fn render(&mut self, snapshot: &Snapshot, last: bool);
}

#[derive(Debug, Default)]
struct TrackerState {
    started: Option<Instant>,
    snapshot: Snapshot,
}

impl TrackerState {
    fn sample(&self) -> Snapshot {
        let mut snapshot = self.snapshot.clone();
        snapshot.elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        snapshot
    }
}

struct Runner<R> {
    done: Sender<()>,
    handle: JoinHandle<R>,
}

/// A [`Progress`] observer that samples its counters on a timer.
///
/// # Example
///
/// ```no_run
/// use minsync::{Render, Snapshot, SyncBuilder, Tracker};
///
/// struct Printer;
///
/// impl Render for Printer {
///     fn render(&mut self, snapshot: &Snapshot, _last: bool) {
///         println!("{} bytes read", snapshot.read);
///     }
/// }
///
/// let tracker = Tracker::new(Printer);
/// let stats = SyncBuilder::new("disk.img", "backup.img")
///     .progress(&tracker)
///     .run()?;
/// # Ok::<(), minsync::Error>(())
/// ```
pub struct Tracker<R: Render> {
    interval: Duration,
    state: Arc<Mutex<TrackerState>>,
    render: Mutex<Option<R>>,
    runner: Mutex<Option<Runner<R>>>,
}

impl<R: Render> Tracker<R> {
    /// Create a tracker that renders once per second.
    pub fn new(render: R) -> Self {
        Self::with_interval(render, Duration::from_secs(1))
    }

    /// Create a tracker with a custom sampling interval.
    pub fn with_interval(render: R, interval: Duration) -> Self {
        Self {
            interval,
            state: Arc::new(Mutex::new(TrackerState::default())),
            render: Mutex::new(Some(render)),
            runner: Mutex::new(None),
        }
    }

    /// Current counters.
    pub fn snapshot(&self) -> Snapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sample()
    }

    /// Take the renderer back, once the session has ended.
    pub fn into_render(self) -> Option<R> {
        self.end();
        self.render
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn update(&self, f: impl FnOnce(&mut Snapshot)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state.snapshot);
    }
}

impl<R: Render> Progress for Tracker<R> {
    fn start(&self, size: u64) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            *state = TrackerState {
                started: Some(Instant::now()),
                snapshot: Snapshot {
                    size,
                    ..Snapshot::default()
                },
            };
        }

        let Some(mut render) = self
            .render
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            // Already running.
            return;
        };

        let (done, done_rx) = crossbeam_channel::bounded::<()>(0);
        let state = Arc::clone(&self.state);
        let interval = self.interval;
        let handle = thread::spawn(move || {
            let sample = || {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .sample()
            };
            render.render(&sample(), false);
            loop {
                match done_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => render.render(&sample(), false),
                    _ => {
                        render.render(&sample(), true);
                        return render;
                    }
                }
            }
        });

        *self.runner.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Runner { done, handle });
    }

    fn read(&self, n: u64) {
        self.update(|s| s.read += n);
    }

    fn written(&self, n: u64) {
        self.update(|s| s.written += n);
    }

    fn zeroed(&self, n: u64) {
        self.update(|s| s.zeroed += n);
    }

    fn queues(&self, load: QueueLoad) {
        self.update(|s| s.queues = load);
    }

    fn end(&self) {
        let runner = self
            .runner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Runner { done, handle }) = runner else {
            return;
        };
        drop(done);
        if let Ok(render) = handle.join() {
            *self.render.lock().unwrap_or_else(PoisonError::into_inner) = Some(render);
        }
    }
}

impl<R: Render> Drop for Tracker<R> {
    fn drop(&mut self) {
        self.end();
    }
}

/// Live terminal report (requires `progress` feature).
///
/// Repaints the multi-line [`Snapshot`] report in place, with a bar
/// tracking bytes read against the file size.
#[cfg(feature = "progress")]
#[cfg_attr(docsrs, doc(cfg(feature = "progress")))]
pub struct TerminalRender {
    bar: indicatif::ProgressBar,
}

#[cfg(feature = "progress")]
impl TerminalRender {
    /// Create a report drawn on stdout.
    #[must_use]
    pub fn new() -> Self {
        use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stdout());
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n[{bar:40.cyan/blue}] {percent:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { bar }
    }
}

#[cfg(feature = "progress")]
impl Default for TerminalRender {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "progress")]
impl Render for TerminalRender {
    fn render(&mut self, snapshot: &Snapshot, last: bool) {
        self.bar.set_length(snapshot.size);
        self.bar.set_position(snapshot.read);
        self.bar.set_message(snapshot.to_string());
        if last {
            self.bar.finish();
        }
    }
}

/// Format a byte count with a binary unit.
///
/// ```
/// assert_eq!(minsync::format_bytes(512), "512 B");
/// assert_eq!(minsync::format_bytes(1536), "1.50 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a duration truncated to whole seconds, e.g. `1h2m3s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, total / 60 % 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
