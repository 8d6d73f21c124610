//! Whole-pass behavior with mailer doubles
//!
//! These tests verify that:
//! - Healthy and redirecting containers produce no mail
//! - A failing container produces exactly one alert with the right layout
//! - A mail-delivery failure does not abort the pass
//! - A transport failure aborts the pass without sending anything

use assert_matches::assert_matches;
use container_monitoring::checker::{CheckError, HealthChecker};
use container_monitoring::runner;
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{FailingMailer, RecordingMailer, get_target, registry_of, test_config};

#[tokio::test]
async fn healthy_pass_sends_no_mail() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&mock_server)
        .await;

    let config = test_config(registry_of(vec![get_target("traefik", &mock_server.uri())]));
    let mailer = RecordingMailer::default();

    runner::run(&config, &HealthChecker::default(), &mailer)
        .await
        .unwrap();

    assert!(mailer.messages().is_empty());
}

#[tokio::test]
async fn failing_container_mails_exactly_one_alert() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&mock_server)
        .await;

    let config = test_config(registry_of(vec![get_target("grafana", &mock_server.uri())]));
    let mailer = RecordingMailer::default();

    runner::run(&config, &HealthChecker::default(), &mailer)
        .await
        .unwrap();

    let messages = mailer.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(
        String::from_utf8(messages[0].clone()).unwrap(),
        "Subject: Problem found on container grafana (code : 500 Internal Server Error)\r\n\r\ninternal error"
    );
}

#[tokio::test]
async fn redirecting_container_takes_no_action() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301))
        .mount(&mock_server)
        .await;

    let config = test_config(registry_of(vec![get_target(
        "portainer",
        &mock_server.uri(),
    )]));
    let mailer = RecordingMailer::default();

    runner::run(&config, &HealthChecker::default(), &mailer)
        .await
        .unwrap();

    assert!(mailer.messages().is_empty());
}

#[tokio::test]
async fn mail_failure_does_not_abort_the_pass() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/front"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&mock_server)
        .await;

    let config = test_config(registry_of(vec![
        get_target("prod-admin", &format!("{}/admin", mock_server.uri())),
        get_target("prod-frontend", &format!("{}/front", mock_server.uri())),
    ]));
    let mailer = FailingMailer::default();

    // Both alerts fail to go out, yet the pass still completes cleanly.
    runner::run(&config, &HealthChecker::default(), &mailer)
        .await
        .unwrap();

    assert_eq!(mailer.attempts(), 2);
}

#[tokio::test]
async fn transport_failure_aborts_the_pass() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    // Whatever order the registry yields, the first check already fails,
    // so no container is ever alerted on.
    let config = test_config(registry_of(vec![
        get_target("gogs", &format!("http://{addr}/a")),
        get_target("jenkins", &format!("http://{addr}/b")),
    ]));
    let mailer = RecordingMailer::default();

    let err = runner::run(&config, &HealthChecker::default(), &mailer)
        .await
        .unwrap_err();

    assert_matches!(err, CheckError::Transport { .. });
    assert!(mailer.messages().is_empty());
}
