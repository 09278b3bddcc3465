//! Event producers for replay.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use sieve_types::Event;

use crate::error::SourceError;

/// An ordered, finite stream of events.
pub trait TraceSource {
    /// Human-readable name, used as the engine source label.
    fn label(&self) -> &str;

    /// The next event, `None` once the trace is exhausted.
    fn next_event(&mut self) -> Option<Result<Event, SourceError>>;
}

/// Events held in memory, yielded front to back.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrace {
    label: String,
    events: VecDeque<Event>,
}

impl MemoryTrace {
    pub fn new(label: impl Into<String>, events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            label: label.into(),
            events: events.into_iter().collect(),
        }
    }

    /// Events not yet yielded.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl TraceSource for MemoryTrace {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_event(&mut self) -> Option<Result<Event, SourceError>> {
        self.events.pop_front().map(Ok)
    }
}

/// One JSON-encoded [`Event`] per line; blank lines are skipped.
#[derive(Debug)]
pub struct JsonlTrace<R> {
    label: String,
    path: PathBuf,
    reader: R,
    line: usize,
    buf: String,
}

impl JsonlTrace<BufReader<File>> {
    /// Opens a trace file; its path becomes the label.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut trace = Self::from_reader(path.display().to_string(), BufReader::new(file));
        trace.path = path.to_path_buf();
        Ok(trace)
    }
}

impl<R: BufRead> JsonlTrace<R> {
    pub fn from_reader(label: impl Into<String>, reader: R) -> Self {
        let label = label.into();
        Self {
            path: PathBuf::from(&label),
            label,
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> TraceSource for JsonlTrace<R> {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_event(&mut self) -> Option<Result<Event, SourceError>> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(source) => {
                    return Some(Err(SourceError::Io {
                        path: self.path.clone(),
                        source,
                    }))
                }
            }

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return Some(serde_json::from_str(text).map_err(|source| SourceError::Parse {
                trace: self.label.clone(),
                line: self.line,
                source,
            }));
        }
    }
}
