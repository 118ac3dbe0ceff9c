//! CLI binary for reconciling an exam snapshot via stdin.
//!
//! Usage:
//!   echo '{"parts": [...], "questions": [...], "offset": 0}' \
//!     | cargo run --bin reconcile
//!
//! Input (JSON on stdin):
//!   - parts: Array — the authored part/group tree
//!   - questions: Array — the current question collection
//!   - offset: Optional<u32> — display-number offset for earlier sections
//!
//! Output (JSON on stdout):
//!   - questions: Array — the reconciled question collection
//!   - removed_persisted: Array<String> — identifiers to delete downstream
//!   - changed: bool — whether reconciliation changed anything
//!   - numbering: Object — display number per question reference
//!   - error: Optional<String> — error message if the request failed

use gapcheck_engine::{config, display_numbers, reconcile, EngineError, ExamSnapshot, Question};
use std::collections::HashMap;
use std::io::Read;
use std::process::ExitCode;

#[derive(serde::Deserialize)]
struct ReconcileRequest {
    #[serde(flatten)]
    snapshot: ExamSnapshot,
    #[serde(default)]
    offset: u32,
}

#[derive(serde::Serialize)]
struct ReconcileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    questions: Option<Vec<Question>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed_persisted: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    changed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    numbering: Option<HashMap<String, u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn error_response(msg: String) -> ReconcileResponse {
    ReconcileResponse {
        questions: None,
        removed_persisted: None,
        changed: None,
        numbering: None,
        error: Some(msg),
    }
}

fn run() -> ReconcileResponse {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        return error_response(format!("Failed to read stdin: {e}"));
    }
    run_on(&input)
}

fn run_on(input: &str) -> ReconcileResponse {
    // Same guards as ExamSnapshot::from_json_str; stdin is the one
    // untrusted boundary of this process
    if input.len() > config::MAX_SNAPSHOT_SIZE {
        let err = EngineError::SnapshotTooLarge {
            size: input.len(),
            max: config::MAX_SNAPSHOT_SIZE,
        };
        return error_response(err.to_string());
    }

    let request: ReconcileRequest = match serde_json::from_str(input) {
        Ok(request) => request,
        Err(e) => return error_response(format!("Invalid request: {e}")),
    };
    if request.snapshot.parts.len() > config::MAX_PARTS {
        let err = EngineError::TooManyParts {
            count: request.snapshot.parts.len(),
            max: config::MAX_PARTS,
        };
        return error_response(err.to_string());
    }

    let outcome = reconcile(&request.snapshot);
    let numbering = display_numbers(&request.snapshot.parts, &outcome.questions, request.offset);
    let numbering: HashMap<String, u32> = numbering
        .iter()
        .map(|(id, number)| (id.to_string(), number))
        .collect();

    ReconcileResponse {
        questions: Some(outcome.questions),
        removed_persisted: Some(outcome.removed_persisted),
        changed: Some(outcome.changed),
        numbering: Some(numbering),
        error: None,
    }
}

fn main() -> ExitCode {
    let response = run();
    let failed = response.error.is_some();
    match serde_json::to_string(&response) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize response: {e}");
            return ExitCode::FAILURE;
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
