//! Health probe for the deployed containers.
//!
//! One run walks the static target registry, probes every endpoint once and
//! mails an alert for every target that answers with an error status.
//! Scheduling of the runs is left to the invoker (a systemd timer or cron).

pub mod alerts;
pub mod checker;
pub mod config;
pub mod mailer;
pub mod runner;
