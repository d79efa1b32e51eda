//! Structural tests for layer boundary enforcement.
//!
//! These tests scan source files to verify that the domain and application
//! layers stay free of infrastructure and presentation imports.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

fn violations_in(layer: &str, forbidden: &[&str]) -> Vec<String> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer);
    let mut violations = Vec::new();
    for file in collect_rs_files(&dir) {
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            for needle in forbidden {
                if line.contains(needle) {
                    violations.push(format!("{rel}:{}: found `{needle}`: {line}", i + 1));
                }
            }
        }
    }
    violations
}

#[test]
fn domain_has_no_outer_layer_imports() {
    let violations = violations_in(
        "domain",
        &[
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
            "tokio",
            "std::fs",
            "std::process",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay pure:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_does_not_reach_into_infra_or_presentation() {
    let violations = violations_in(
        "application",
        &["crate::infra", "crate::commands", "crate::output", "std::fs"],
    );
    assert!(
        violations.is_empty(),
        "application/ must only use ports:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_does_not_import_presentation() {
    let violations = violations_in("infra", &["crate::commands", "crate::output"]);
    assert!(
        violations.is_empty(),
        "infra/ must not depend on presentation:\n{}",
        violations.join("\n")
    );
}
