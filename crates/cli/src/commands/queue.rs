// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue inspection and failed-item resolution. None of these contact the
//! backend.

use sfs_core::{FailedOperation, QueuedOperation};

use super::{parse_op_id, Context};
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn list(ctx: &Context, output: OutputFormat) -> Result<()> {
    let queue = ctx.queue()?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(queue.peek_all())?),
        OutputFormat::Text => {
            if queue.is_empty() {
                println!("Queue is empty.");
            }
            for op in queue.peek_all() {
                println!("{}", format_pending(op));
            }
        }
    }
    Ok(())
}

pub fn failed(ctx: &Context, output: OutputFormat) -> Result<()> {
    let queue = ctx.queue()?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(queue.failed())?),
        OutputFormat::Text => {
            if queue.failed().is_empty() {
                println!("No failed operations.");
            }
            for item in queue.failed() {
                println!("{}", format_failed(item));
            }
        }
    }
    Ok(())
}

pub fn retry(ctx: &Context, id: Option<&str>, all: bool) -> Result<()> {
    let mut queue = ctx.queue()?;
    let ids = match id {
        Some(id) if !all => vec![parse_op_id(id)?],
        _ => queue.failed().iter().map(|f| f.op.id).collect(),
    };
    for id in &ids {
        let new_id = queue.retry_failed(*id)?;
        println!("Requeued {} as {}", id, new_id);
    }
    if ids.is_empty() {
        println!("No failed operations.");
    }
    Ok(())
}

pub fn discard(ctx: &Context, id: Option<&str>, all: bool) -> Result<()> {
    let mut queue = ctx.queue()?;
    match id {
        Some(id) if !all => {
            let removed = queue.discard_failed(parse_op_id(id)?)?;
            println!("Discarded {}", removed.op.id);
        }
        _ => {
            let count = queue.clear_failed()?;
            println!("Discarded {} failed operation(s)", count);
        }
    }
    Ok(())
}

pub fn reset(ctx: &Context) -> Result<()> {
    ctx.reset_queue()?;
    println!("Queue reset.");
    Ok(())
}

fn format_pending(op: &QueuedOperation) -> String {
    let mut line = format!("{} {} {}", op.id, op.kind, op.entity_key);
    if op.attempts > 0 {
        line.push_str(&format!(" (attempts: {}", op.attempts));
        if let Some(err) = &op.last_error {
            line.push_str(&format!(", last error: {}", err));
        }
        line.push(')');
    }
    line
}

fn format_failed(item: &FailedOperation) -> String {
    format!(
        "{} {} {} [{}] {}",
        item.op.id, item.op.kind, item.op.entity_key, item.cause, item.reason
    )
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
