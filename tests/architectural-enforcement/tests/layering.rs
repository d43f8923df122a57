//! Layering checks
//!
//! The core crate must stay headless: a TUI dependency creeping into it
//! breaks the surface-swap property the workspace is built around.

use std::fs;

use walkdir::WalkDir;

use architectural_enforcement::workspace_src;

/// Rust sources of a workspace member, as (path, contents) pairs
fn member_sources(member: &str) -> Vec<(String, String)> {
    let root = workspace_src(member);
    WalkDir::new(&root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| {
            let path = e.path().display().to_string();
            let contents = fs::read_to_string(e.path())
                .unwrap_or_else(|err| panic!("failed to read {path}: {err}"));
            (path, contents)
        })
        .collect()
}

/// Drop everything from the `#[cfg(test)]` marker onwards
///
/// Test modules sit at the bottom of each file in this codebase, so a
/// simple cut is enough for the checks below.
fn production_code(contents: &str) -> &str {
    match contents.find("#[cfg(test)]") {
        Some(pos) => &contents[..pos],
        None => contents,
    }
}

#[test]
fn core_has_no_ui_dependencies() {
    let sources = member_sources("core");
    assert!(!sources.is_empty(), "no core sources found");

    for (path, contents) in &sources {
        for forbidden in ["ratatui", "crossterm"] {
            assert!(
                !contents.contains(forbidden),
                "{path} references {forbidden}; the core must stay headless"
            );
        }
    }
}

#[test]
fn core_production_code_does_not_unwrap() {
    for (path, contents) in member_sources("core") {
        let code = production_code(&contents);
        assert!(
            !code.contains(".unwrap()"),
            "{path} calls unwrap() outside tests; propagate the error instead"
        );
    }
}

#[test]
fn tui_does_not_speak_http() {
    for (path, contents) in member_sources("tui") {
        assert!(
            !contents.contains("reqwest"),
            "{path} uses reqwest directly; all server traffic goes through eddy-core"
        );
    }
}
