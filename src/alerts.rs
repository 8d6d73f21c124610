//! Alert formatting for failing containers.

/// Build the raw mail message for a failing container.
///
/// The message is a bare `Subject` header, a blank line and the response
/// body verbatim. Container names come from the static registry only, so
/// the subject is not escaped against header injection.
pub fn alert_message(container: &str, status_line: &str, body: &str) -> Vec<u8> {
    format!(
        "Subject: Problem found on container {container} (code : {status_line})\r\n\r\n{body}"
    )
    .into_bytes()
}
