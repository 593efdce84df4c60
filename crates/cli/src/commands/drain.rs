// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::Context;
use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::sync::{DrainOutcome, DrainReport};

pub async fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let engine = ctx.engine().await?;
    let report = engine.process_queue().await;
    engine.shutdown();
    engine.connectivity().shutdown();

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&to_json(&report))?),
        OutputFormat::Text => print!("{}", render(&report)),
    }
    match halt_error(&report) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// The error a drain that stopped on a network failure exits with.
///
/// Operations left behind stay queued for the next drain.
pub(crate) fn halt_error(report: &DrainReport) -> Option<Error> {
    match &report.outcome {
        DrainOutcome::Halted { id, reason, .. } => {
            Some(Error::RetryableNetwork(format!("{reason} (operation {id} stays queued)")))
        }
        DrainOutcome::Disconnected => Some(Error::RetryableNetwork(format!(
            "connection lost with {} operation(s) queued",
            report.remaining
        ))),
        _ => None,
    }
}

fn outcome_name(outcome: &DrainOutcome) -> &'static str {
    match outcome {
        DrainOutcome::AlreadyRunning => "already_running",
        DrainOutcome::Offline => "offline",
        DrainOutcome::Drained => "drained",
        DrainOutcome::Halted { .. } => "halted",
        DrainOutcome::Disconnected => "disconnected",
        DrainOutcome::PersistenceFailed(_) => "persistence_failed",
    }
}

fn to_json(report: &DrainReport) -> serde_json::Value {
    let mut value = json!({
        "outcome": outcome_name(&report.outcome),
        "submitted": report.submitted,
        "failed": report.failed,
        "remaining": report.remaining,
    });
    match &report.outcome {
        DrainOutcome::Halted { id, attempts, reason } => {
            value["halted_at"] = json!({ "id": id.to_string(), "attempts": attempts, "reason": reason });
        }
        DrainOutcome::PersistenceFailed(reason) => value["reason"] = json!(reason),
        _ => {}
    }
    value
}

pub(crate) fn render(report: &DrainReport) -> String {
    let mut out = String::new();
    match &report.outcome {
        DrainOutcome::AlreadyRunning => out.push_str("A drain is already running.\n"),
        DrainOutcome::Offline => out.push_str("Backend unreachable; nothing sent.\n"),
        DrainOutcome::Drained => {}
        DrainOutcome::Halted { id, attempts, reason } => out.push_str(&format!(
            "Stopped at {} after {} attempt(s): {}\n",
            id, attempts, reason
        )),
        DrainOutcome::Disconnected => out.push_str("Connection lost; drain stopped.\n"),
        DrainOutcome::PersistenceFailed(reason) => {
            out.push_str(&format!("Local store error; drain stopped: {}\n", reason))
        }
    }
    out.push_str(&format!(
        "Submitted: {}, failed: {}, remaining: {}\n",
        report.submitted, report.failed, report.remaining
    ));
    if report.failed > 0 {
        out.push_str("Run 'sfs failed' to review failed operations.\n");
    }
    out
}

#[cfg(test)]
#[path = "drain_tests.rs"]
mod tests;
