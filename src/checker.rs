//! Health checks against individual targets.

use std::fmt;
use std::time::Duration;

use tracing::{debug, instrument, trace, warn};

use crate::config::{HttpMethod, Target, TargetRegistry};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result type alias for health checks
pub type CheckResult<T> = Result<T, CheckError>;

/// Errors that abort a probe pass
#[derive(Debug)]
pub enum CheckError {
    /// The target is malformed or not part of the registry
    InvalidTarget(String),

    /// The target could not be reached at the network level
    Transport {
        target: String,
        source: reqwest::Error,
    },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::InvalidTarget(msg) => write!(f, "invalid check target: {}", msg),
            CheckError::Transport { target, source } => {
                write!(f, "couldn't get health state of container {}: {}", target, source)
            }
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::InvalidTarget(_) => None,
            CheckError::Transport { source, .. } => Some(source),
        }
    }
}

/// Classification of a received response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// 2xx, the container answered as expected
    Healthy,

    /// 4xx or 5xx, the container needs attention
    Failing,

    /// Informational and redirect codes; no action is taken on these
    Ignored,
}

impl Health {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Health::Healthy,
            400.. => Health::Failing,
            _ => Health::Ignored,
        }
    }
}

/// Result of probing one target.
#[derive(Debug)]
pub struct CheckOutcome {
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl CheckOutcome {
    pub fn health(&self) -> Health {
        Health::from_status(self.status.as_u16())
    }

    /// Status line as it appears in alert subjects, e.g. `503 Service Unavailable`.
    pub fn status_line(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("{} {}", self.status.as_u16(), reason),
            None => self.status.as_u16().to_string(),
        }
    }
}

/// Performs the HTTP probes.
///
/// The client is built once with the transport timeout and reused across
/// all checks of a pass.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    client: reqwest::Client,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HealthChecker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Probe a single target and classify the response.
    ///
    /// `registry` guards against checks for targets that were never
    /// configured; an unknown or malformed target aborts the whole pass.
    /// A failure while reading the body of a received response is not
    /// fatal: classification proceeds with an empty body.
    #[instrument(skip_all, fields(container = %target.name))]
    pub async fn check(
        &self,
        registry: &TargetRegistry,
        target: &Target,
    ) -> CheckResult<CheckOutcome> {
        if target.name.is_empty() || target.url.is_empty() || !registry.contains(&target.name) {
            return Err(CheckError::InvalidTarget(format!(
                "{:?} is not a registered container",
                target.name
            )));
        }

        let request = match target.method {
            HttpMethod::Post => {
                let Some(form) = &target.login else {
                    return Err(CheckError::InvalidTarget(format!(
                        "container {} is probed via POST but has no login form",
                        target.name
                    )));
                };

                debug!("trying to log in to container {}", target.name);
                self.client.post(&target.url).json(form)
            }
            HttpMethod::Get => self.client.get(&target.url),
        };

        let response = request.send().await.map_err(|source| CheckError::Transport {
            target: target.name.clone(),
            source,
        })?;

        let status = response.status();
        trace!("received status {status}");

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("error while retrieving the response body: {e}");
                String::new()
            }
        };

        Ok(CheckOutcome { status, body })
    }
}
