// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde_json::json;

use super::Context;
use crate::cache::CachedValue;
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::FetchError;

pub async fn run(ctx: &Context, key: &str, output: OutputFormat) -> Result<()> {
    let cache = ctx.cache();
    let result = if ctx.offline {
        cache
            .read_through(key, || async { Err(FetchError::Unavailable("offline mode".into())) })
            .await?
    } else {
        let backend = ctx.backend();
        let limit = ctx.config.sync.submit_timeout();
        cache.read_through_backend(key, backend.as_ref(), limit).await?
    };

    match output {
        OutputFormat::Json => {
            let value = json!({
                "key": key,
                "value": result.value,
                "fetched_at": result.fetched_at,
                "stale": result.stale,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            if result.stale {
                eprintln!("{}", stale_notice(&result, Utc::now()));
            }
            println!("{}", serde_json::to_string_pretty(&result.value)?);
        }
    }
    Ok(())
}

/// One-line warning shown above a cached value.
pub(crate) fn stale_notice(result: &CachedValue, now: DateTime<Utc>) -> String {
    format!(
        "warning: backend unreachable; showing value cached {} ago ({})",
        format_age(result.age(now)),
        result.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86_399 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    }
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
