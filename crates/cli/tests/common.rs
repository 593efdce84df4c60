// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Bare `sfs` command with no state directory set.
pub fn sfs() -> Command {
    cargo_bin_cmd!("sfs")
}

/// A private state directory for one test.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace { dir: TempDir::new().unwrap() }
    }

    /// `sfs` pointed at this workspace, never touching the network.
    pub fn offline(&self) -> Command {
        let mut cmd = self.online();
        cmd.arg("--offline");
        cmd
    }

    /// `sfs` pointed at this workspace, probing the configured remote.
    pub fn online(&self) -> Command {
        let mut cmd = sfs();
        cmd.env_remove("SFS_REMOTE_URL").env_remove("RUST_LOG");
        cmd.arg("--state-dir").arg(self.dir.path());
        cmd
    }

    /// Point the workspace at a remote backend.
    pub fn set_remote(&self, url: &str) {
        self.offline().args(["config", "init", "--url", url]).assert().success();
    }
}
