//! ---
//! gardu_section: "15-testing-qa"
//! gardu_subsection: "integration-tests"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Repository-level checks for shipped configuration and headers."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use gardu_common::config::AppConfig;

fn root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..")
}

fn read(path: &str) -> String {
    let full = root().join(path);
    fs::read_to_string(&full)
        .unwrap_or_else(|err| panic!("failed to read {}: {}", full.display(), err))
}

fn rust_sources(dir: &Path, found: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            rust_sources(&path, found);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            found.push(path);
        }
    }
}

#[test]
fn example_config_parses_with_expected_defaults() {
    let config = AppConfig::from_str(&read("configs/gardu.example.toml")).unwrap();
    assert_eq!(config.cache.ttl, Duration::from_secs(300));
    assert_eq!(config.clock.utc_offset, "+07:00");
    assert_eq!(config.history.display_limit, 100);
    assert!(!config.create.enforce_unique_key);
}

#[test]
fn source_files_carry_frontmatter() {
    let mut sources = Vec::new();
    for dir in ["crates", "bin"] {
        rust_sources(&root().join(dir), &mut sources);
    }
    assert!(!sources.is_empty());
    for source in sources {
        let content = fs::read_to_string(&source).unwrap();
        assert!(
            content.starts_with("//! ---\n//! gardu_section:"),
            "{} must start with the gardu frontmatter header",
            source.display()
        );
    }
}

#[test]
fn manifests_carry_frontmatter() {
    for manifest in [
        "Cargo.toml",
        "crates/gardu-common/Cargo.toml",
        "crates/gardu-logging/Cargo.toml",
        "crates/gardu-core/Cargo.toml",
        "crates/gardu-testharness/Cargo.toml",
        "bin/garductl/Cargo.toml",
        "tests/Cargo.toml",
    ] {
        assert!(
            read(manifest).starts_with("# ---"),
            "{manifest} must include frontmatter header"
        );
    }
}
