// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;

use super::Context;
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::SyncStatus;

#[derive(Debug, Serialize)]
struct StatusView<'a> {
    remote: &'a str,
    is_online: bool,
    is_syncing: bool,
    failed_checks: u32,
    pending_count: usize,
    failed_count: usize,
}

pub async fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let engine = ctx.engine().await?;
    let status = engine.status();
    let failed_checks = engine.connectivity().failed_checks();
    engine.connectivity().shutdown();

    print!("{}", render(&ctx.config.remote.url, &status, failed_checks, output)?);
    Ok(())
}

pub(crate) fn render(
    remote: &str,
    status: &SyncStatus,
    failed_checks: u32,
    output: OutputFormat,
) -> Result<String> {
    match output {
        OutputFormat::Json => {
            let view = StatusView {
                remote,
                is_online: status.is_online,
                is_syncing: status.is_syncing,
                failed_checks,
                pending_count: status.pending_count,
                failed_count: status.failed_count,
            };
            Ok(format!("{}\n", serde_json::to_string_pretty(&view)?))
        }
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("Remote: {}\n", remote));
            let state = if status.is_online { "online" } else { "offline" };
            if failed_checks > 0 {
                out.push_str(&format!("Status: {} ({} failed reachability checks)\n", state, failed_checks));
            } else {
                out.push_str(&format!("Status: {}\n", state));
            }
            out.push_str(&format!("Pending: {}\n", status.pending_count));
            if status.failed_count > 0 {
                out.push_str(&format!(
                    "Failed: {} (see 'sfs failed')\n",
                    status.failed_count
                ));
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
