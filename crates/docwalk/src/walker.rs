//! The walker: configured entry point of reads and bulk processing.

use std::time::Duration;

use crate::error::invariant;
use crate::{Error, Result, TRACING_TARGET_PROCESS, WalkConfig};

/// Entry point for chunked reads and bulk processing.
///
/// A walker holds only its [`WalkConfig`]; references and queries are
/// passed per call, so one walker can serve any number of collections.
#[derive(Debug, Clone, Default)]
pub struct Walker {
    config: WalkConfig,
}

impl Walker {
    /// Creates a walker after validating `config`.
    pub fn new(config: WalkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the walker configuration.
    #[inline]
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Resolves the page size of a call.
    ///
    /// Sizes above the store ceiling are clamped to it.
    pub(crate) fn page_size(&self, requested: Option<usize>) -> Result<usize> {
        let size = requested.unwrap_or(self.config.default_chunk_size);
        invariant(size > 0, || "Chunk size must be a positive number".to_owned())?;
        Ok(size.min(self.config.max_query_limit))
    }

    /// Returns a progress counter that logs only in verbose mode.
    pub(crate) fn progress(&self, label: &'static str) -> Progress {
        Progress {
            verbose: self.config.verbose,
            label,
            count: 0,
        }
    }
}

/// Converts a throttle delay in seconds, rejecting negative and non-finite values.
pub(crate) fn throttle_delay(secs: f64) -> Result<Option<Duration>> {
    invariant(secs.is_finite() && secs >= 0.0, || {
        format!("Throttle must be a non-negative number of seconds, got {secs}")
    })?;
    if secs == 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|err| Error::invariant(format!("Throttle of {secs} seconds is out of range: {err}")))
}

/// Counts processed pages and logs each one when verbose.
#[derive(Debug)]
pub(crate) struct Progress {
    verbose: bool,
    label: &'static str,
    count: usize,
}

impl Progress {
    /// Counts one step.
    pub fn tick(&mut self) {
        self.count += 1;
        if self.verbose {
            tracing::info!(target: TRACING_TARGET_PROCESS, "{}: {}", self.label, self.count);
        }
    }

    /// Logs a completion summary when verbose.
    pub fn finish(&self, processed: usize) {
        if self.verbose {
            tracing::info!(
                target: TRACING_TARGET_PROCESS,
                pages = self.count,
                "Processed {processed} documents"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_defaults_and_clamps() {
        let walker = Walker::new(WalkConfig::default()).unwrap();
        assert_eq!(walker.page_size(None).unwrap(), 500);
        assert_eq!(walker.page_size(Some(40)).unwrap(), 40);
        assert_eq!(walker.page_size(Some(5000)).unwrap(), 1000);
        assert!(walker.page_size(Some(0)).unwrap_err().is_invariant());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = WalkConfig::default().with_max_query_limit(0);
        assert!(Walker::new(config).is_err());
    }

    #[test]
    fn throttle_conversion() {
        assert_eq!(throttle_delay(0.0).unwrap(), None);
        assert_eq!(
            throttle_delay(1.5).unwrap(),
            Some(Duration::from_millis(1500))
        );
        assert!(throttle_delay(-1.0).is_err());
        assert!(throttle_delay(f64::NAN).is_err());
        assert!(throttle_delay(f64::INFINITY).is_err());
        assert!(throttle_delay(1e20).unwrap_err().is_invariant());
        assert_eq!(
            throttle_delay(3600.0).unwrap(),
            Some(Duration::from_secs(3600))
        );
    }

    #[test]
    fn progress_counts_without_logging() {
        let walker = Walker::default();
        let mut progress = walker.progress("Processing chunk");
        progress.tick();
        progress.tick();
        assert_eq!(progress.count, 2);
    }
}
