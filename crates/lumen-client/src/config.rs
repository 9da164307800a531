//! Client configuration, validation, and error types.
//!
//! [`ClientConfig`] is the input for [`ConnectionWorker::spawn`] and
//! [`RenderClient::new`]. [`validate()`](ClientConfig::validate) runs
//! before any thread is started, so a bad config never leaves a worker
//! half-running.
//!
//! [`ConnectionWorker::spawn`]: crate::ConnectionWorker::spawn
//! [`RenderClient::new`]: crate::RenderClient::new

use std::error::Error;
use std::fmt;
use std::time::Duration;

use lumen_core::DEFAULT_OVERHEAD_HEIGHT;
use lumen_wire::{FramingMode, DEFAULT_MAX_FRAME_LEN, DEFAULT_READ_CHUNK};

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 6666;

/// Environment variable overriding [`ClientConfig::host`].
pub const ENV_HOST: &str = "LUMEN_HOST";

/// Environment variable overriding [`ClientConfig::port`].
pub const ENV_PORT: &str = "LUMEN_PORT";

// ── ReconnectConfig ────────────────────────────────────────────────

/// Delay schedule between failed connection attempts.
///
/// The first retry waits `initial_delay_ms`; each further consecutive
/// failure multiplies the delay by `backoff_factor` up to `max_delay_ms`.
/// A successful connection resets the schedule.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconnectConfig {
    /// Delay before the first retry. Default: 100.
    pub initial_delay_ms: u64,
    /// Multiplier applied after each consecutive failure. Default: 2.0.
    pub backoff_factor: f64,
    /// Upper bound on the delay. Default: 5000.
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            backoff_factor: 2.0,
            max_delay_ms: 5_000,
        }
    }
}

impl ReconnectConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_delay_ms == 0 {
            return Err(ConfigError::InvalidBackoff {
                reason: "initial_delay_ms must be non-zero".into(),
            });
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(ConfigError::InvalidBackoff {
                reason: format!(
                    "backoff_factor must be finite and >= 1.0, got {}",
                    self.backoff_factor
                ),
            });
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ConfigError::InvalidBackoff {
                reason: format!(
                    "max_delay_ms ({}) is below initial_delay_ms ({})",
                    self.max_delay_ms, self.initial_delay_ms
                ),
            });
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating or applying a [`ClientConfig`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The server host is empty.
    EmptyHost,
    /// The server port is zero.
    InvalidPort,
    /// `read_buffer_size` or `max_frame_len` is zero.
    ZeroReadBuffer,
    /// A timeout that must be positive is zero.
    ZeroTimeout {
        /// Name of the offending field.
        field: &'static str,
    },
    /// [`ReconnectConfig`] invariant violated.
    InvalidBackoff {
        /// Description of which invariant was violated.
        reason: String,
    },
    /// The overhead camera height is NaN, infinite, or not positive.
    InvalidCameraHeight {
        /// The invalid value.
        value: f32,
    },
    /// An environment override could not be parsed.
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
    },
    /// The ingest thread could not be spawned.
    ThreadSpawnFailed {
        /// Error reported by the OS.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyHost => write!(f, "server host is empty"),
            Self::InvalidPort => write!(f, "server port must be non-zero"),
            Self::ZeroReadBuffer => write!(f, "read buffer and frame limit must be non-zero"),
            Self::ZeroTimeout { field } => write!(f, "{field} must be non-zero"),
            Self::InvalidBackoff { reason } => write!(f, "invalid reconnect backoff: {reason}"),
            Self::InvalidCameraHeight { value } => {
                write!(f, "overhead camera height must be positive, got {value}")
            }
            Self::InvalidEnv { var, value } => write!(f, "cannot parse {var}={value:?}"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "failed to spawn ingest thread: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

// ── ClientConfig ───────────────────────────────────────────────────

/// Everything needed to run a client against one server.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Server host name or address. Default: `"localhost"`.
    pub host: String,
    /// Server port. Default: 6666.
    pub port: u16,
    /// How the incoming byte stream is split into messages.
    pub framing: FramingMode,
    /// Size of the buffer passed to each socket read. Default: 8192.
    pub read_buffer_size: usize,
    /// Partial-frame limit in delimited mode. Default: 1 MiB.
    pub max_frame_len: usize,
    /// Per-address connect timeout. Default: 2000.
    pub connect_timeout_ms: u64,
    /// How long a read may block before the worker rechecks its shutdown
    /// flag. Default: 250.
    pub read_poll_ms: u64,
    /// Drop a connection that has delivered nothing for this long.
    /// `None` (default) waits forever.
    pub idle_timeout_ms: Option<u64>,
    /// Socket write timeout for receipts. Default: 2000.
    pub write_timeout_ms: u64,
    /// Reconnect schedule.
    pub reconnect: ReconnectConfig,
    /// Camera height used when a snapshot carries no camera override.
    /// Default: 300.
    pub overhead_camera_height: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            framing: FramingMode::default(),
            read_buffer_size: DEFAULT_READ_CHUNK,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            connect_timeout_ms: 2_000,
            read_poll_ms: 250,
            idle_timeout_ms: None,
            write_timeout_ms: 2_000,
            reconnect: ReconnectConfig::default(),
            overhead_camera_height: DEFAULT_OVERHEAD_HEIGHT,
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at `host:port`.
    pub fn for_endpoint(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Default configuration with [`ENV_HOST`] / [`ENV_PORT`] applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply host/port overrides from `lookup`, which maps a variable
    /// name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(raw) = lookup(ENV_PORT) {
            self.port = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_PORT,
                    value: raw.clone(),
                })?;
        }
        Ok(self)
    }

    /// `host:port`, as used in log lines.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.read_buffer_size == 0 || self.max_frame_len == 0 {
            return Err(ConfigError::ZeroReadBuffer);
        }
        for (field, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("read_poll_ms", self.read_poll_ms),
            ("write_timeout_ms", self.write_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroTimeout { field });
            }
        }
        if self.idle_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout {
                field: "idle_timeout_ms",
            });
        }
        self.reconnect.validate()?;
        let h = self.overhead_camera_height;
        if !h.is_finite() || h <= 0.0 {
            return Err(ConfigError::InvalidCameraHeight { value: h });
        }
        Ok(())
    }

    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub(crate) fn read_poll(&self) -> Duration {
        Duration::from_millis(self.read_poll_ms)
    }

    pub(crate) fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub(crate) fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ClientConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.endpoint(), "localhost:6666");
        assert_eq!(cfg.read_buffer_size, 8192);
        assert_eq!(cfg.framing, FramingMode::PerRead);
    }

    #[test]
    fn empty_host_rejected() {
        let cfg = ClientConfig::for_endpoint("  ", 6666);
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyHost));
    }

    #[test]
    fn zero_port_rejected() {
        let cfg = ClientConfig::for_endpoint("localhost", 0);
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidPort));
    }

    #[test]
    fn zero_buffers_rejected() {
        let mut cfg = ClientConfig::default();
        cfg.read_buffer_size = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroReadBuffer));

        let mut cfg = ClientConfig::default();
        cfg.max_frame_len = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroReadBuffer));
    }

    #[test]
    fn zero_timeouts_rejected() {
        let mut cfg = ClientConfig::default();
        cfg.read_poll_ms = 0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroTimeout {
                field: "read_poll_ms"
            })
        );

        let mut cfg = ClientConfig::default();
        cfg.idle_timeout_ms = Some(0);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroTimeout {
                field: "idle_timeout_ms"
            })
        ));
    }

    #[test]
    fn backoff_invariants() {
        let mut cfg = ClientConfig::default();
        cfg.reconnect.backoff_factor = 0.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidBackoff { .. })
        ));

        let mut cfg = ClientConfig::default();
        cfg.reconnect.backoff_factor = f64::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidBackoff { .. })
        ));

        let mut cfg = ClientConfig::default();
        cfg.reconnect.max_delay_ms = 10;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidBackoff { .. })
        ));
    }

    #[test]
    fn camera_height_must_be_positive() {
        for h in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let mut cfg = ClientConfig::default();
            cfg.overhead_camera_height = h;
            assert!(matches!(
                cfg.validate(),
                Err(ConfigError::InvalidCameraHeight { .. })
            ));
        }
    }

    #[test]
    fn overrides_apply_host_and_port() {
        let cfg = ClientConfig::default()
            .with_overrides(|var| match var {
                ENV_HOST => Some("10.0.0.5".into()),
                ENV_PORT => Some(" 7000 ".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(cfg.endpoint(), "10.0.0.5:7000");
    }

    #[test]
    fn bad_port_override_rejected() {
        let err = ClientConfig::default()
            .with_overrides(|var| (var == ENV_PORT).then(|| "sixty".to_string()))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                var: ENV_PORT,
                value: "sixty".into()
            }
        );
    }

    #[test]
    fn missing_overrides_keep_defaults() {
        let cfg = ClientConfig::default().with_overrides(|_| None).unwrap();
        assert_eq!(cfg.endpoint(), "localhost:6666");
    }
}
