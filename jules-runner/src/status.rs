//! Live per-project status board.
//!
//! ## Concurrency model
//!
//! - The entry list is append-only. Its mutex is held just long enough to push
//!   or to clone the `Arc`s for one frame.
//! - Each entry's state is an `AtomicU8` that only ever moves
//!   `Pending -> Done` or `Pending -> Failed`. Workers write it, the render
//!   loop reads it, and neither takes a lock to do so.
//! - A pending counter guarded by a mutex + condvar acts as the latch that
//!   [`StatusBoard::render`] waits on. It reaches zero exactly when every
//!   entry is terminal.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use colored::Colorize;

const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

// ---------------------------------------------------------------------------
// Entry state
// ---------------------------------------------------------------------------

/// Lifecycle of a single board entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntryState {
    Pending = 0,
    Done = 1,
    Failed = 2,
}

impl EntryState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => EntryState::Done,
            2 => EntryState::Failed,
            _ => EntryState::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, EntryState::Pending)
    }

    fn plain_tag(self) -> &'static str {
        match self {
            EntryState::Pending => "[ .. ]",
            EntryState::Done => "[ ok ]",
            EntryState::Failed => "[FAIL]",
        }
    }
}

struct Entry {
    label: String,
    state: AtomicU8,
}

impl Entry {
    fn state(&self) -> EntryState {
        EntryState::from_u8(self.state.load(Ordering::Acquire))
    }
}

/// A point-in-time copy of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub label: String,
    pub state: EntryState,
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Shared {
    entries: Mutex<Vec<Arc<Entry>>>,
    pending: Mutex<usize>,
    settled: Condvar,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How [`StatusBoard::render`] draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Redraw every entry in place with ANSI cursor movement.
    Live,
    /// Print one line per entry as it reaches a terminal state.
    Plain,
}

impl RenderMode {
    /// `Live` when stdout is a terminal, `Plain` otherwise.
    pub fn detect() -> Self {
        if io::stdout().is_terminal() {
            RenderMode::Live
        } else {
            RenderMode::Plain
        }
    }
}

/// Concurrently-updated set of labeled entries.
#[derive(Clone, Default)]
pub struct StatusBoard {
    shared: Arc<Shared>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending entry. The returned handle is the only way to
    /// move it to a terminal state.
    pub fn create(&self, label: impl Into<String>) -> EntryHandle {
        let entry = Arc::new(Entry {
            label: label.into(),
            state: AtomicU8::new(EntryState::Pending as u8),
        });
        // Count first so the latch never reads zero while an entry exists.
        *lock(&self.shared.pending) += 1;
        lock(&self.shared.entries).push(Arc::clone(&entry));
        EntryHandle {
            entry,
            shared: Arc::clone(&self.shared),
            finished: false,
        }
    }

    /// Number of entries not yet terminal.
    pub fn pending(&self) -> usize {
        *lock(&self.shared.pending)
    }

    /// Entries in creation order.
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.entries()
            .iter()
            .map(|e| EntrySnapshot {
                label: e.label.clone(),
                state: e.state(),
            })
            .collect()
    }

    fn entries(&self) -> Vec<Arc<Entry>> {
        lock(&self.shared.entries).clone()
    }

    /// Block until every entry is terminal, without drawing anything.
    pub fn wait(&self) {
        let guard = lock(&self.shared.pending);
        let _guard = self
            .shared
            .settled
            .wait_while(guard, |pending| *pending > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Wait up to `timeout` for the next state change. Returns `true` once settled.
    fn wait_for_change(&self, timeout: Duration) -> bool {
        let guard = lock(&self.shared.pending);
        if *guard == 0 {
            return true;
        }
        let (guard, _) = self
            .shared
            .settled
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        *guard == 0
    }

    /// Draw the board to `out` until every entry is terminal.
    ///
    /// This is the run's barrier: it returns only after the last entry has
    /// settled, and the final frame always shows every entry's terminal state.
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        mode: RenderMode,
        refresh: Duration,
    ) -> io::Result<()> {
        match mode {
            RenderMode::Live => self.render_live(out, refresh),
            RenderMode::Plain => self.render_plain(out, refresh),
        }
    }

    fn render_live<W: Write>(&self, out: &mut W, refresh: Duration) -> io::Result<()> {
        let mut drawn = 0usize;
        let mut tick = 0usize;
        loop {
            // Read the latch before the entries so the last frame is complete.
            let settled = self.pending() == 0;
            let entries = self.entries();

            let mut frame = String::new();
            if drawn > 0 {
                let _ = write!(frame, "\x1b[{drawn}A");
            }
            for entry in &entries {
                let _ = writeln!(frame, "\x1b[2K{}", live_line(entry, tick));
            }
            out.write_all(frame.as_bytes())?;
            out.flush()?;
            drawn = entries.len();

            if settled {
                return Ok(());
            }
            self.wait_for_change(refresh);
            tick = tick.wrapping_add(1);
        }
    }

    fn render_plain<W: Write>(&self, out: &mut W, refresh: Duration) -> io::Result<()> {
        let mut reported: Vec<bool> = Vec::new();
        loop {
            let settled = self.pending() == 0;
            let entries = self.entries();
            reported.resize(entries.len(), false);

            for (entry, seen) in entries.iter().zip(reported.iter_mut()) {
                let state = entry.state();
                if state.is_terminal() && !*seen {
                    writeln!(out, "{} {}", state.plain_tag(), entry.label)?;
                    *seen = true;
                }
            }
            out.flush()?;

            if settled {
                return Ok(());
            }
            self.wait_for_change(refresh);
        }
    }
}

fn live_line(entry: &Entry, tick: usize) -> String {
    match entry.state() {
        EntryState::Pending => {
            let frame = SPINNER[tick % SPINNER.len()].to_string();
            format!("{} {}", frame.yellow(), entry.label)
        }
        EntryState::Done => format!("{} {}", "✓".green().bold(), entry.label),
        EntryState::Failed => format!("{} {}", "✗".red().bold(), entry.label.red()),
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Owning worker's handle to one entry.
///
/// Both transitions consume the handle. Dropping a handle that is still
/// pending marks the entry failed, so an unwinding worker cannot hold the
/// board open forever.
pub struct EntryHandle {
    entry: Arc<Entry>,
    shared: Arc<Shared>,
    finished: bool,
}

impl EntryHandle {
    pub fn mark_done(mut self) {
        self.finish(EntryState::Done);
    }

    pub fn mark_failed(mut self) {
        self.finish(EntryState::Failed);
    }

    fn finish(&mut self, state: EntryState) {
        if self.finished {
            return;
        }
        self.finished = true;
        let moved = self.entry.state.compare_exchange(
            EntryState::Pending as u8,
            state as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if moved.is_ok() {
            let mut pending = lock(&self.shared.pending);
            *pending = pending.saturating_sub(1);
            self.shared.settled.notify_all();
        }
    }
}

impl Drop for EntryHandle {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(EntryState::Failed);
        }
    }
}
