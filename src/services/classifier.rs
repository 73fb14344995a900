//! Judges a captured response against the contract an endpoint must honour.
//!
//! Classification is a pure function of its inputs: the same response and
//! spec always yield the same [`Verdict`].

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::config::AuthPolicy;
use crate::error::HarnessError;
use crate::models::envelope::has_data;
use crate::models::{EndpointSpec, Envelope, ExportFormat, Shape, Verdict};
use crate::services::executor::RawResponse;

static FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*?\s*=\s*(?:[\w-]+'[\w-]*')?"?([^";]+)"?"#)
        .expect("filename pattern is valid")
});

pub fn classify(spec: &EndpointSpec, response: &RawResponse, policy: AuthPolicy) -> Verdict {
    match &spec.shape {
        Shape::Unauthorized => classify_unauthorized(spec, response, policy),
        Shape::SuccessEnvelope => classify_success(spec, response),
        Shape::ErrorEnvelope => classify_error_envelope(spec, response),
        Shape::ContentType(mime) => classify_content_type(spec, response, mime),
        Shape::Export(format) => classify_export(spec, response, *format),
        Shape::Redirect { location_contains } => {
            classify_redirect(spec, response, location_contains)
        }
        Shape::StatusOnly => classify_status(spec, response),
    }
}

/// The verdict recorded when a request never produced a response.
pub fn request_failed(error: &HarnessError, critical: bool) -> Verdict {
    Verdict::fail("Request failed")
        .with_details(error.to_string())
        .critical(critical)
}

fn status_details(response: &RawResponse) -> serde_json::Value {
    json!({
        "status": response.status,
        "body": response.excerpt(),
    })
}

fn classify_unauthorized(
    spec: &EndpointSpec,
    response: &RawResponse,
    policy: AuthPolicy,
) -> Verdict {
    let details = status_details(response);

    match response.status {
        401 => match Envelope::parse(&response.body) {
            Ok(envelope) if envelope.is_unauthorized() => {
                Verdict::pass("Correctly returns 401 Unauthorized").critical(spec.critical)
            }
            Ok(_) => Verdict::fail(
                "Returns 401 but body is not {\"success\": false, \"error\": \"Unauthorized\"}",
            ),
            Err(e) => Verdict::fail(format!("Returns 401 with non-JSON body: {}", e)),
        }
        .with_details(details),
        200 if is_attachment(response) => {
            Verdict::fail("CRITICAL SECURITY ISSUE: Serves a download without authentication")
                .critical(true)
                .with_details(details)
        }
        200 => match response.json() {
            Ok(value) if has_data(&value) => {
                Verdict::fail("CRITICAL SECURITY ISSUE: Returns data without authentication")
                    .critical(true)
                    .with_details(details)
            }
            Ok(_) => match policy {
                AuthPolicy::Strict => {
                    Verdict::fail("Returns 200 without data where 401 was expected")
                }
                AuthPolicy::Lenient => Verdict::pass("Returns 200 but no sensitive data"),
            }
            .with_details(details),
            Err(_) => Verdict::fail("Returns 200 with non-JSON response").with_details(details),
        },
        status => {
            Verdict::fail(format!("Unexpected response status: {}", status)).with_details(details)
        }
    }
}

fn classify_success(spec: &EndpointSpec, response: &RawResponse) -> Verdict {
    let details = status_details(response);

    if !spec.expects_status(response.status) {
        return Verdict::fail(format!(
            "Expected status {:?}, got {}",
            spec.expected_status, response.status
        ))
        .critical(spec.critical)
        .with_details(details);
    }

    match Envelope::parse(&response.body) {
        Ok(Envelope::Success { .. }) => {
            Verdict::pass("Returns {\"success\": true, \"data\": ...}").critical(spec.critical)
        }
        Ok(Envelope::Error { error }) => {
            Verdict::fail(format!("Returns error envelope: {}", error))
                .critical(spec.critical)
                .with_details(details)
        }
        Ok(Envelope::Other(_)) => Verdict::fail(
            "Response is not a success envelope: expected success=true and a data field",
        )
        .critical(spec.critical)
        .with_details(details),
        Err(e) => Verdict::fail(format!("Malformed JSON: {}", e))
            .critical(spec.critical)
            .with_details(details),
    }
}

fn classify_error_envelope(spec: &EndpointSpec, response: &RawResponse) -> Verdict {
    let status = response.status;
    let details = status_details(response);

    if !spec.expects_status(status) {
        return Verdict::fail(format!("Unexpected status code: {}", status))
            .critical(spec.critical)
            .with_details(details);
    }

    match Envelope::parse(&response.body) {
        Ok(Envelope::Error { .. }) => Verdict::pass(format!(
            "Error response properly structured (Status: {})",
            status
        ))
        .critical(spec.critical),
        Ok(_) => Verdict::fail(format!(
            "Error response structure invalid (Status: {}): expected success=false and a string error",
            status
        ))
        .critical(spec.critical)
        .with_details(details),
        Err(_) => Verdict::fail(format!(
            "Error response not valid JSON (Status: {})",
            status
        ))
        .critical(spec.critical)
        .with_details(details),
    }
}

fn classify_content_type(spec: &EndpointSpec, response: &RawResponse, mime: &str) -> Verdict {
    let content_type = response.header("content-type");
    let details = json!({ "status": response.status, "content_type": content_type });

    let verdict = if content_type.contains(mime) {
        Verdict::pass(format!("Returns correct content type: {}", mime))
    } else if response.status == 401 {
        Verdict::pass("Returns 401; content type not enforced")
    } else {
        Verdict::fail(format!(
            "Content type mismatch: got '{}', expected '{}'",
            content_type, mime
        ))
        .critical(spec.critical)
    };
    verdict.with_details(details)
}

fn classify_export(spec: &EndpointSpec, response: &RawResponse, format: ExportFormat) -> Verdict {
    if response.status != 200 {
        return Verdict::fail(format!("HTTP {}: {}", response.status, response.excerpt()))
            .critical(spec.critical);
    }

    let content_type = response.header("content-type");
    let disposition = response.header("content-disposition");
    let details = json!({ "content_type": content_type, "content_disposition": disposition });

    if !content_type.contains(format.content_type()) {
        return Verdict::fail(format!(
            "Content-Type mismatch: got '{}', expected '{}'",
            content_type,
            format.content_type()
        ))
        .critical(spec.critical)
        .with_details(details);
    }

    if !is_attachment(response) {
        return Verdict::fail(format!(
            "Content-Disposition mismatch: got '{}', expected an attachment",
            disposition
        ))
        .critical(spec.critical)
        .with_details(details);
    }

    match attachment_filename(disposition) {
        Some(name) if name.to_ascii_lowercase().ends_with(&format!(".{}", format.extension())) => {
            Verdict::pass(format!("{} export served as {}", format.label(), name))
                .critical(spec.critical)
                .with_details(details)
        }
        Some(name) => Verdict::fail(format!(
            "Content-Disposition filename mismatch: got '{}', expected a .{} file",
            name,
            format.extension()
        ))
        .critical(spec.critical)
        .with_details(details),
        None => Verdict::fail("Content-Disposition missing filename")
            .critical(spec.critical)
            .with_details(details),
    }
}

fn classify_redirect(spec: &EndpointSpec, response: &RawResponse, fragment: &str) -> Verdict {
    let status = response.status;
    let location = response.header("location");

    if spec.expects_status(status) {
        if location.contains(fragment) {
            Verdict::pass(format!("Redirects to {}", location)).critical(spec.critical)
        } else {
            Verdict::fail(format!(
                "Redirects but not to {} (Location: '{}')",
                fragment, location
            ))
            .critical(spec.critical)
        }
    } else if status == 200 {
        Verdict::fail("Accessible without authentication (SECURITY ISSUE)").critical(true)
    } else {
        Verdict::fail(format!("Unexpected response (Status: {})", status))
            .critical(spec.critical)
            .with_details(status_details(response))
    }
}

fn classify_status(spec: &EndpointSpec, response: &RawResponse) -> Verdict {
    let status = response.status;
    if spec.expects_status(status) {
        Verdict::pass(format!("Responds with expected status {}", status)).critical(spec.critical)
    } else {
        Verdict::fail(format!(
            "Unexpected status code: {} (expected one of {:?})",
            status, spec.expected_status
        ))
        .critical(spec.critical)
        .with_details(status_details(response))
    }
}

fn is_attachment(response: &RawResponse) -> bool {
    response
        .header("content-disposition")
        .to_ascii_lowercase()
        .contains("attachment")
}

pub fn attachment_filename(disposition: &str) -> Option<String> {
    FILENAME
        .captures(disposition)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}
