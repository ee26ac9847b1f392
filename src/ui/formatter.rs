//! Pure formatting functions for UI output.
//!
//! This module contains all display logic separated from user interaction.

use std::path::Path;

use console::style;

use crate::domain::{ReleaseTarget, SemVer};
use crate::manifest::PersistStage;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a warning in yellow.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display the computed version and image tag.
///
/// In release mode also shows the local version the manifest will carry
/// once the release has gone out.
pub fn display_target(target: &ReleaseTarget, next_local: Option<SemVer>) {
    println!("\n{}", style(format!("{} target:", target.mode)).bold());
    println!("  Version: {}", style(&target.version).green());
    println!("  Image:   {}", style(&target.docker_tag).green());
    if let Some(next) = next_local {
        println!("  Local version after release: {}", style(next).cyan());
    }
}

/// Display the steps a run would execute, for `--dry-run`.
pub fn display_plan(steps: &[String]) {
    println!("\n{}", style("Dry run, nothing will be executed:").bold());
    for (i, step) in steps.iter().enumerate() {
        println!("  Step {}: {}", i + 1, step);
    }
}

/// Explain what is left to reconcile after a failure past the image push.
pub fn display_partial_release(docker_tag: &str, version: &str, remote: &str, tag_created: bool) {
    display_warning(&format!(
        "image {} is already published but tag {} was not pushed and the \
         local version was not bumped; reconcile manually",
        docker_tag, version
    ));

    let command = if tag_created {
        format!("git push {} {}", remote, version)
    } else {
        format!(
            "git tag -a {v} -m \"Release {v}\" && git push {r} {v}",
            v = version,
            r = remote
        )
    };
    println!(
        "\n{} To finish by hand, run:\n  {}",
        style("→").yellow(),
        style(command).cyan()
    );
}

/// Explain how to finish a local version bump that stopped at `stage`.
///
/// The release itself is out at this point; only the manifest change needs
/// completing.
pub fn display_unfinished_bump(
    stage: PersistStage,
    manifest_path: &Path,
    version: &SemVer,
    remote: &str,
    branch: &str,
) {
    let state = match stage {
        PersistStage::Write => format!(
            "{} still holds the previous local version",
            manifest_path.display()
        ),
        PersistStage::Commit => format!(
            "{} already holds local version {} but is not committed",
            manifest_path.display(),
            version
        ),
        PersistStage::Push => format!(
            "the bump to {} is committed but not pushed; the release gate \
             will report the branch as ahead until it is",
            version
        ),
    };
    display_warning(&format!("release is published and tagged, but {}", state));

    println!(
        "\n{} To finish by hand, run:\n  {}",
        style("→").yellow(),
        style(unfinished_bump_command(stage, manifest_path, version, remote, branch)).cyan()
    );
}

fn unfinished_bump_command(
    stage: PersistStage,
    manifest_path: &Path,
    version: &SemVer,
    remote: &str,
    branch: &str,
) -> String {
    let push = format!("git push {} {}", remote, branch);
    let commit = format!(
        "git commit -m \"[dock-release] Bump local version to {}\" {}",
        version,
        manifest_path.display()
    );
    match stage {
        PersistStage::Write => format!(
            "set version.klarrio = \"{}\" in {}, then {} && {}",
            version,
            manifest_path.display(),
            commit,
            push
        ),
        PersistStage::Commit => format!("{} && {}", commit, push),
        PersistStage::Push => push,
    }
}
