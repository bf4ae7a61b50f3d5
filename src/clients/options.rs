//! Value components: per-client transport options and logging level.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport settings a client hands to its HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub follow_redirects: bool,
}

impl Options {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);
}

impl Default for Options {
    fn default() -> Self {
        Self {
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
            follow_redirects: true,
        }
    }
}

/// How much of each exchange a client logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerLevel {
    /// No logging.
    #[default]
    None,
    /// Request method and URL, response status and elapsed time.
    Basic,
    /// `Basic` plus request and response headers.
    Headers,
    /// Headers, bodies and metadata of both request and response.
    Full,
}

impl LoggerLevel {
    pub fn logs_headers(self) -> bool {
        self >= LoggerLevel::Headers
    }

    pub fn logs_bodies(self) -> bool {
        self == LoggerLevel::Full
    }
}
