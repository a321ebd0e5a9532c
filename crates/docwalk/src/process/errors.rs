use std::fmt;

use crate::TRACING_TARGET_PROCESS;

/// A failure of a handler, kept until the walk is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProcessingError {
    Document { id: String, message: String },
    Chunk { page: usize, message: String },
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document { id, message } => {
                write!(f, "Error processing document {id}: {message}")
            }
            Self::Chunk { page, message } => write!(f, "Error processing chunk {page}: {message}"),
        }
    }
}

/// Bounded store of handler failures of one processing call.
///
/// Up to `cap` failures are retained and logged together by [`flush`].
/// Failures past the cap are logged as they happen, after a single warning.
///
/// [`flush`]: ErrorLog::flush
#[derive(Debug)]
pub(crate) struct ErrorLog {
    cap: usize,
    retained: Vec<ProcessingError>,
    truncated: bool,
}

impl ErrorLog {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            retained: Vec::new(),
            truncated: false,
        }
    }

    pub fn record(&mut self, error: ProcessingError) {
        if self.retained.len() < self.cap {
            self.retained.push(error);
            return;
        }

        if !self.truncated {
            self.truncated = true;
            tracing::warn!(
                target: TRACING_TARGET_PROCESS,
                cap = self.cap,
                "Error logging was limited to {} errors",
                self.cap
            );
        }
        tracing::error!(target: TRACING_TARGET_PROCESS, "{error}");
    }

    /// Logs every retained failure.
    pub fn flush(self) {
        for error in self.retained {
            tracing::error!(target: TRACING_TARGET_PROCESS, "{error}");
        }
    }
}
