/// End-to-end tests for the CLI
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MANIFEST: &str = r#"
[[asset]]
id = "Assets/Door.prefab"
dependencies = ["Assets/Wood.mat", "Assets/Missing.png"]
kind = "Prefab"

[[asset]]
id = "Assets/Wood.mat"
dependencies = ["Assets/Wood.png"]

[[asset]]
id = "Assets/Wood.png"

[[asset]]
id = "Assets/Old.mat"
build = "excluded-unreferenced"
"#;

/// Writes the sample manifest into a fresh project directory
fn project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("assets.toml");
    fs::write(&manifest, MANIFEST).unwrap();
    (dir, manifest)
}

fn manifest_arg(manifest: &Path) -> String {
    manifest.to_string_lossy().into_owned()
}

// Exit code tests for CLI
mod exit_code_tests {
    use super::*;

    /// Exit code 0: --help should return success
    #[test]
    fn test_exit_code_help() {
        cargo_bin_cmd!("asset-ref-index").arg("--help").assert().code(0);
    }

    /// Exit code 0: --version should return success
    #[test]
    fn test_exit_code_version() {
        cargo_bin_cmd!("asset-ref-index").arg("--version").assert().code(0);
    }

    /// Exit code 2: Invalid arguments
    #[test]
    fn test_exit_code_invalid_argument() {
        cargo_bin_cmd!("asset-ref-index")
            .args(["stats", "--invalid-option"])
            .assert()
            .code(2);
    }

    /// Exit code 2: Unknown subcommand
    #[test]
    fn test_exit_code_unknown_subcommand() {
        cargo_bin_cmd!("asset-ref-index")
            .arg("reindex")
            .assert()
            .code(2);
    }

    /// Exit code 3: Application error - manifest does not exist
    #[test]
    fn test_exit_code_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("nope.toml");
        cargo_bin_cmd!("asset-ref-index")
            .args(["show", "Assets/Door.prefab", "-m", manifest_arg(&manifest).as_str()])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Failed to open asset manifest"));
    }

    /// Exit code 3: Application error - malformed manifest
    #[test]
    fn test_exit_code_malformed_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("assets.toml");
        fs::write(&manifest, "[[asset]]\nid = \"A\"\n[[asset]]\nid = \"A\"\n").unwrap();
        cargo_bin_cmd!("asset-ref-index")
            .args(["rebuild", "-m", manifest_arg(&manifest).as_str()])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Failed to parse asset manifest"));
    }

    /// Exit code 3: Application error - asset is not in the manifest
    #[test]
    fn test_exit_code_unknown_asset() {
        let (_dir, manifest) = project();
        cargo_bin_cmd!("asset-ref-index")
            .args(["show", "Assets/Nothing.mat", "-m", manifest_arg(&manifest).as_str()])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("not tracked"));
    }

    /// Exit code 1: verify found an asymmetric snapshot
    #[test]
    fn test_exit_code_verification_failed() {
        let dir = TempDir::new().unwrap();
        let snapshot = dir.path().join("index.json");
        fs::write(
            &snapshot,
            r#"{
                "version": 1,
                "fresh": true,
                "records": {
                    "A": { "id": "A", "dependencies": ["B"] },
                    "B": { "id": "B" }
                }
            }"#,
        )
        .unwrap();

        cargo_bin_cmd!("asset-ref-index")
            .current_dir(dir.path())
            .args(["verify", "--snapshot", "index.json"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("B"))
            .stderr(predicate::str::contains("Index is inconsistent"));
    }
}

mod command_tests {
    use super::*;

    #[test]
    fn test_rebuild_writes_snapshot() {
        let (dir, manifest) = project();
        cargo_bin_cmd!("asset-ref-index")
            .args(["rebuild", "-m", manifest_arg(&manifest).as_str()])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Indexed 4 asset(s)"));

        let snapshot = dir.path().join(".refindex").join("index.json");
        assert!(snapshot.exists());
        let content = fs::read_to_string(snapshot).unwrap();
        assert!(content.contains("\"fresh\":true"));
    }

    #[test]
    fn test_show_lists_both_directions() {
        let (_dir, manifest) = project();
        cargo_bin_cmd!("asset-ref-index")
            .args(["show", "Assets/Wood.mat", "-m", manifest_arg(&manifest).as_str()])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Dependencies (1):"))
            .stdout(predicate::str::contains("→ Assets/Wood.png"))
            .stdout(predicate::str::contains("Referenced by (1):"))
            .stdout(predicate::str::contains("← Assets/Door.prefab"));
    }

    #[test]
    fn test_show_marks_missing_dependency() {
        let (_dir, manifest) = project();
        cargo_bin_cmd!("asset-ref-index")
            .args(["show", "Assets/Door.prefab", "-m", manifest_arg(&manifest).as_str()])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Assets/Door.prefab  (Prefab)  [included]"))
            .stdout(predicate::str::contains("→ Assets/Missing.png  [missing]"));
    }

    #[test]
    fn test_unused_lists_excluded_assets() {
        let (_dir, manifest) = project();
        cargo_bin_cmd!("asset-ref-index")
            .args(["unused", "-m", manifest_arg(&manifest).as_str()])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Assets/Old.mat"))
            .stdout(predicate::str::contains("Assets/Door.prefab").not());
    }

    #[test]
    fn test_verify_after_rebuild() {
        let (_dir, manifest) = project();
        let manifest = manifest_arg(&manifest);
        cargo_bin_cmd!("asset-ref-index")
            .args(["rebuild", "-m", manifest.as_str()])
            .assert()
            .code(0);
        cargo_bin_cmd!("asset-ref-index")
            .args(["verify", "-m", manifest.as_str()])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Index is consistent"));
    }

    #[test]
    fn test_stats_and_clear() {
        let (_dir, manifest) = project();
        let manifest = manifest_arg(&manifest);
        cargo_bin_cmd!("asset-ref-index")
            .args(["rebuild", "-m", manifest.as_str()])
            .assert()
            .code(0);

        cargo_bin_cmd!("asset-ref-index")
            .args(["stats", "-m", manifest.as_str()])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Assets:          4"))
            .stdout(predicate::str::contains("Build id:"));

        cargo_bin_cmd!("asset-ref-index")
            .args(["clear", "-m", manifest.as_str()])
            .assert()
            .code(0)
            .stderr(predicate::str::contains("Index cleared"));

        cargo_bin_cmd!("asset-ref-index")
            .args(["stats", "-m", manifest.as_str()])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Assets:          0"))
            .stdout(predicate::str::contains("Fresh:           no"));
    }

    #[test]
    fn test_snapshot_flag_overrides_default_location() {
        let (dir, manifest) = project();
        let snapshot = dir.path().join("custom").join("refs.json");
        cargo_bin_cmd!("asset-ref-index")
            .args([
                "rebuild",
                "-m",
                manifest_arg(&manifest).as_str(),
                "--snapshot",
                snapshot.to_str().unwrap(),
            ])
            .assert()
            .code(0);

        assert!(snapshot.exists());
        assert!(!dir.path().join(".refindex").exists());
    }
}
