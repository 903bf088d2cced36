use std::io::{self, Write};

use log::debug;

use iam_request_wizard_core::SubmissionState;

pub(crate) fn note(msg: &str) {
    let _ = writeln!(io::stderr(), "iam-request-wizard: {}", msg);
}

pub(crate) fn warn(msg: &str) {
    let _ = writeln!(io::stderr(), "iam-request-wizard (warning): {}", msg);
}

pub(crate) fn print_submission_state(state: &SubmissionState) {
    debug!("submission state: {:?}", state);
    let stderr = io::stderr();
    let mut w = stderr.lock();
    match state {
        SubmissionState::Idle => {}
        SubmissionState::Loading => {
            let _ = writeln!(w, "Submitting request for review...");
        }
        SubmissionState::Success { request_id } => {
            let _ = writeln!(w, "Request {} submitted for review", request_id);
        }
        SubmissionState::Error { message } => {
            let _ = writeln!(w, "Submission failed: {}", message);
            let _ = writeln!(w, "Your selections were kept; fix the issue and resubmit.");
        }
    }
}

pub(crate) fn print_roles(roles: &[String]) {
    let stdout = io::stdout();
    let mut w = stdout.lock();
    for role in roles {
        let _ = writeln!(w, "{}", role);
    }
}
