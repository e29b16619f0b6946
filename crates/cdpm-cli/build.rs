//! Stamps the CLI version with the commit it was built from.
//!
//! `CDPM_VERSION` becomes `<package version>+<short commit>[.dirty]`, or the
//! plain package version outside a git checkout. Packagers can set
//! `CDPM_BUILD_VERSION` to override it.

use std::env;
use std::process::Command;

const OVERRIDE: &str = "CDPM_BUILD_VERSION";

fn main() {
    println!("cargo:rerun-if-env-changed={OVERRIDE}");
    for path in ["HEAD", "index"] {
        println!("cargo:rerun-if-changed=../../.git/{path}");
    }

    let package = env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let version = match env::var(OVERRIDE) {
        Ok(explicit) if !explicit.trim().is_empty() => explicit.trim().to_string(),
        _ => match commit() {
            Some(commit) if worktree_dirty() => format!("{package}+{commit}.dirty"),
            Some(commit) => format!("{package}+{commit}"),
            None => package,
        },
    };
    println!("cargo:rustc-env=CDPM_VERSION={version}");
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn commit() -> Option<String> {
    git(&["rev-parse", "--short=10", "HEAD"]).filter(|c| !c.is_empty())
}

fn worktree_dirty() -> bool {
    git(&["status", "--porcelain", "--untracked-files=no"]).is_some_and(|s| !s.is_empty())
}
