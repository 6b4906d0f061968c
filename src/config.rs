//! Packet handler configuration.
//!
//! Options can be built in code or loaded from a TOML table:
//!
//! ```toml
//! readiness = "success-only"
//! payload_log_limit = 64
//! ```

use std::{fmt, path::Path, str::FromStr};

use serde::Deserialize;

use crate::error::Error;

/// Which CONNACK marks the connection as ready.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessPolicy {
    /// Only a CONNACK with return code 0 (connection accepted).
    #[default]
    SuccessOnly,
    /// Any well-formed CONNACK, including rejections.
    AnyConnack,
}

impl FromStr for ReadinessPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success-only" => Ok(ReadinessPolicy::SuccessOnly),
            "any-connack" => Ok(ReadinessPolicy::AnyConnack),
            other => Err(Error::Configuration(format!(
                "unknown readiness policy `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for ReadinessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessPolicy::SuccessOnly => write!(f, "success-only"),
            ReadinessPolicy::AnyConnack => write!(f, "any-connack"),
        }
    }
}

/// Options for a [`PacketHandler`](crate::PacketHandler).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerOptions {
    #[serde(default)]
    pub(crate) readiness: ReadinessPolicy,

    /// Number of body bytes included when a dropped packet is logged.
    #[serde(default = "default_payload_log_limit")]
    pub(crate) payload_log_limit: usize,
}

fn default_payload_log_limit() -> usize {
    32
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            readiness: ReadinessPolicy::default(),
            payload_log_limit: default_payload_log_limit(),
        }
    }
}

impl HandlerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set which CONNACK return codes mark the connection ready.
    pub fn readiness(mut self, policy: ReadinessPolicy) -> Self {
        self.readiness = policy;
        self
    }

    /// Set how many body bytes are logged for a dropped packet.
    pub fn payload_log_limit(mut self, limit: usize) -> Self {
        self.payload_log_limit = limit;
        self
    }

    pub fn readiness_policy(&self) -> ReadinessPolicy {
        self.readiness
    }

    pub fn log_limit(&self) -> usize {
        self.payload_log_limit
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.payload_log_limit == 0 {
            return Err(Error::Configuration(
                "payload_log_limit must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse and validate options from TOML.
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let options: HandlerOptions =
            toml::from_str(content).map_err(|e| Error::Configuration(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}
