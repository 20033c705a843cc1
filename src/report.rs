//! report — line-oriented result sink.
//!
//! Every user-facing result (scores, fitted rates, cross-validation errors,
//! error-model estimates) is written as one formatted line through a
//! [`Reporter`]. Lines go to stdout, to a log file opened in append mode, or to
//! an in-memory buffer, and are mirrored as `tracing` info events.
use std::{
    cell::RefCell,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    rc::Rc,
};

/// Shared in-memory line buffer.
pub type LineBuffer = Rc<RefCell<Vec<String>>>;

#[derive(Debug, Clone)]
enum Sink {
    Stdout,
    File(Rc<RefCell<File>>),
    Memory(LineBuffer),
}

/// Destination for report lines.
#[derive(Debug, Clone)]
pub struct Reporter {
    sink: Sink,
}

impl Reporter {
    pub fn stdout() -> Self {
        Self { sink: Sink::Stdout }
    }

    /// Append to `path`, creating it if needed.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the file cannot be opened.
    pub fn append_to(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { sink: Sink::File(Rc::new(RefCell::new(file))) })
    }

    /// Collect lines in memory; the returned buffer sees every line written.
    pub fn memory() -> (Self, LineBuffer) {
        let buffer = LineBuffer::default();
        (Self { sink: Sink::Memory(Rc::clone(&buffer)) }, buffer)
    }

    /// Write one line.
    ///
    /// # Errors
    /// Propagates write failures of stdout or the log file.
    pub fn line(&self, text: impl AsRef<str>) -> io::Result<()> {
        let text = text.as_ref();
        tracing::info!(target: "genefam::report", "{text}");
        match &self.sink {
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{text}")
            }
            Sink::File(file) => writeln!(file.borrow_mut(), "{text}"),
            Sink::Memory(buffer) => {
                buffer.borrow_mut().push(text.to_string());
                Ok(())
            }
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::stdout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    // Purpose
    // -------
    // Memory sinks keep lines in order; clones share the buffer.
    fn memory_sink_collects_lines() {
        let (reporter, buffer) = Reporter::memory();
        let clone = reporter.clone();

        reporter.line("first").unwrap();
        clone.line(format!("second {}", 2)).unwrap();

        assert_eq!(*buffer.borrow(), vec!["first".to_string(), "second 2".to_string()]);
    }

    #[test]
    // Purpose
    // -------
    // File sinks append instead of truncating.
    fn file_sink_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.log");
        fs::write(&path, "existing\n").unwrap();

        Reporter::append_to(&path).unwrap().line("new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nnew\n");
    }
}
