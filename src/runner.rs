//! One probe pass over the whole registry.

use tracing::{debug, error, info, instrument, warn};

use crate::alerts;
use crate::checker::{CheckResult, Health, HealthChecker};
use crate::config::Config;
use crate::mailer::Mailer;

/// Check every registered container once and mail an alert for each one
/// answering with an error status.
///
/// A transport-level failure aborts the pass immediately: remaining
/// containers are not checked. A mail-delivery failure only loses that one
/// alert; the pass continues.
#[instrument(skip_all)]
pub async fn run(
    config: &Config,
    checker: &HealthChecker,
    mailer: &impl Mailer,
) -> CheckResult<()> {
    for target in config.targets.iter() {
        let outcome = checker.check(&config.targets, target).await?;

        match outcome.health() {
            Health::Healthy => info!("container {} is healthy", target.name),
            Health::Failing => {
                warn!(
                    "container {} is not responding as expected, status code {}",
                    target.name,
                    outcome.status.as_u16()
                );
                debug!("container {} response body: {}", target.name, outcome.body);

                let message =
                    alerts::alert_message(&target.name, &outcome.status_line(), &outcome.body);

                match mailer
                    .send(&config.smtp, &config.sender, &config.receivers, &message)
                    .await
                {
                    Ok(()) => info!("mail alert sent for container {}", target.name),
                    Err(e) => {
                        error!("failed to send mail alert for container {}: {e}", target.name)
                    }
                }
            }
            Health::Ignored => {}
        }
    }

    Ok(())
}
