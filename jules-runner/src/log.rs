//! Operator-facing output sink.
//!
//! Everything the person running `jules` is meant to read (the status board,
//! failure blocks, captured command output) goes through an [`OperatorLog`].
//! It is an explicit value handed to the orchestrator, so tests swap stdout
//! for an in-memory buffer with [`OperatorLog::capture`].

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Sink = Box<dyn Write + Send>;

/// Cloneable, thread-safe writer. Each call locks the sink once.
#[derive(Clone)]
pub struct OperatorLog {
    sink: Arc<Mutex<Sink>>,
}

impl fmt::Debug for OperatorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorLog").finish_non_exhaustive()
    }
}

impl OperatorLog {
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        OperatorLog {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// A log writing into memory, plus a handle to read it back.
    pub fn capture() -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        (Self::from_writer(captured.clone()), captured)
    }

    fn lock(&self) -> MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `msg` followed by a newline.
    pub fn line(&self, msg: impl fmt::Display) -> io::Result<()> {
        let mut sink = self.lock();
        writeln!(sink, "{msg}")?;
        sink.flush()
    }

    /// Write `bytes` verbatim, adding a trailing newline if they lack one.
    pub fn raw(&self, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let mut sink = self.lock();
        sink.write_all(bytes)?;
        if !bytes.ends_with(b"\n") {
            sink.write_all(b"\n")?;
        }
        sink.flush()
    }
}

impl Write for OperatorLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}

/// Read side of [`OperatorLog::capture`].
#[derive(Clone, Default)]
pub struct CapturedOutput {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
