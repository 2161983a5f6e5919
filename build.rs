// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=CAMERA_INSPECTOR_VERSION");

    // Packagers may pin the version string explicitly
    let version = std::env::var("CAMERA_INSPECTOR_VERSION").unwrap_or_else(|_| {
        let base = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
        match short_commit_hash() {
            Some(hash) => format!("{}-{}", base, hash),
            None => base,
        }
    });

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

fn short_commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
