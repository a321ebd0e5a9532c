//! Walker configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default maximum number of documents a single query may return.
pub const DEFAULT_MAX_QUERY_LIMIT: usize = 1000;

/// Default page size of chunked reads and bulk processing.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default number of handler errors retained per processing call.
pub const DEFAULT_MAX_STORED_ERRORS: usize = 1000;

/// Configuration injected into a [`Walker`](crate::Walker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct WalkConfig {
    /// Log page counters and completion counts at info level
    #[cfg_attr(
        feature = "config",
        arg(long = "docwalk-verbose", env = "DOCWALK_VERBOSE", default_value_t = false)
    )]
    #[serde(default)]
    pub verbose: bool,

    /// Maximum number of documents a single store query may return
    #[cfg_attr(
        feature = "config",
        arg(
            long = "docwalk-max-query-limit",
            env = "DOCWALK_MAX_QUERY_LIMIT",
            default_value_t = DEFAULT_MAX_QUERY_LIMIT
        )
    )]
    #[serde(default = "default_max_query_limit")]
    pub max_query_limit: usize,

    /// Page size used when a call does not specify one
    #[cfg_attr(
        feature = "config",
        arg(
            long = "docwalk-chunk-size",
            env = "DOCWALK_CHUNK_SIZE",
            default_value_t = DEFAULT_CHUNK_SIZE
        )
    )]
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,

    /// Maximum number of handler errors kept in memory per processing call
    #[cfg_attr(
        feature = "config",
        arg(
            long = "docwalk-max-stored-errors",
            env = "DOCWALK_MAX_STORED_ERRORS",
            default_value_t = DEFAULT_MAX_STORED_ERRORS
        )
    )]
    #[serde(default = "default_max_stored_errors")]
    pub max_stored_errors: usize,
}

fn default_max_query_limit() -> usize {
    DEFAULT_MAX_QUERY_LIMIT
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_stored_errors() -> usize {
    DEFAULT_MAX_STORED_ERRORS
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            max_query_limit: DEFAULT_MAX_QUERY_LIMIT,
            default_chunk_size: DEFAULT_CHUNK_SIZE,
            max_stored_errors: DEFAULT_MAX_STORED_ERRORS,
        }
    }
}

impl WalkConfig {
    /// Enable or disable progress logging.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the maximum number of documents a single query may return.
    #[must_use]
    pub fn with_max_query_limit(mut self, limit: usize) -> Self {
        self.max_query_limit = limit;
        self
    }

    /// Set the page size used when a call does not specify one.
    #[must_use]
    pub fn with_default_chunk_size(mut self, chunk_size: usize) -> Self {
        self.default_chunk_size = chunk_size;
        self
    }

    /// Set the number of handler errors kept in memory per processing call.
    #[must_use]
    pub fn with_max_stored_errors(mut self, max: usize) -> Self {
        self.max_stored_errors = max;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_query_limit == 0 {
            return Err(Error::invalid_config("max_query_limit must be positive"));
        }
        if self.default_chunk_size == 0 {
            return Err(Error::invalid_config("default_chunk_size must be positive"));
        }
        if self.default_chunk_size > self.max_query_limit {
            return Err(Error::invalid_config(format!(
                "default_chunk_size {} exceeds max_query_limit {}",
                self.default_chunk_size, self.max_query_limit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = WalkConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.verbose);
        assert_eq!(config.max_query_limit, 1000);
        assert_eq!(config.default_chunk_size, 500);
        assert_eq!(config.max_stored_errors, 1000);
    }

    #[test]
    fn rejects_chunk_size_above_ceiling() {
        let config = WalkConfig::default()
            .with_max_query_limit(100)
            .with_default_chunk_size(200);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: WalkConfig = serde_json::from_str(r#"{ "verbose": true }"#).unwrap();
        assert!(config.verbose);
        assert_eq!(config.default_chunk_size, DEFAULT_CHUNK_SIZE);
    }
}
