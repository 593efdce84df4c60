// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use yare::parameterized;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("sfs").chain(args.iter().copied()))
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["status", "--offline", "--state-dir", "/tmp/sfs", "--verbose"]).unwrap();
    assert!(cli.offline);
    assert!(cli.verbose);
    assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/sfs")));
    assert!(matches!(cli.command, Command::Status { output: OutputFormat::Text }));
}

#[test]
fn test_enqueue_with_payload() {
    let cli = parse(&["enqueue", "update", "product:1", r#"{"price":12}"#]).unwrap();
    let Command::Enqueue { mutation } = cli.command else {
        panic!("expected enqueue");
    };
    assert_eq!(mutation.kind, "update");
    assert_eq!(mutation.key, "product:1");
    assert_eq!(mutation.payload.as_deref(), Some(r#"{"price":12}"#));
}

#[test]
fn test_submit_without_payload() {
    let cli = parse(&["submit", "delete", "product:1"]).unwrap();
    let Command::Submit { mutation } = cli.command else {
        panic!("expected submit");
    };
    assert!(mutation.payload.is_none());
}

#[parameterized(
    empty_key = { &["enqueue", "create", ""] },
    whitespace_key = { &["fetch", "  "] },
    retry_without_target = { &["retry"] },
    retry_id_and_all = { &["retry", "1-0-0", "--all"] },
    discard_without_target = { &["discard"] },
    bad_output = { &["status", "-o", "yaml"] },
)]
fn test_rejected_invocations(args: &[&str]) {
    assert!(parse(args).is_err());
}

#[test]
fn test_retry_all() {
    let cli = parse(&["retry", "--all"]).unwrap();
    assert!(matches!(cli.command, Command::Retry { id: None, all: true }));
}

#[test]
fn test_queue_subcommands() {
    assert!(matches!(
        parse(&["queue", "list", "-o", "json"]).unwrap().command,
        Command::Queue(QueueCommand::List { output: OutputFormat::Json })
    ));
    assert!(matches!(
        parse(&["queue", "reset"]).unwrap().command,
        Command::Queue(QueueCommand::Reset)
    ));
}

#[test]
fn test_config_init_url() {
    let cli = parse(&["config", "init", "--url", "ws://shop:7890"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Config(ConfigCommand::Init { url: Some(ref u) }) if u == "ws://shop:7890"
    ));
}
