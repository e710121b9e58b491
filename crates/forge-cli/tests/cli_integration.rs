//! Integration tests for the forge binary and the library calls behind it.

use forge_core::ProjectDescription;
use forge_core::description::{FileDescriptor, ModuleDescriptor};
use std::path::Path;
use std::process::{Command, Output};

fn forge(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_forge"))
        .arg("--project")
        .arg(project)
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run forge")
}

fn sample() -> ProjectDescription {
    ProjectDescription::from_modules(vec![
        ModuleDescriptor::new(
            "parsing",
            vec![
                FileDescriptor::new("Lexer", false, &["Token", "<string>"]),
                FileDescriptor::new("Token", true, &[]),
            ],
        ),
        ModuleDescriptor::new("app", vec![FileDescriptor::new("Main", false, &["Lexer"])]),
    ])
}

#[test]
fn test_plan_without_description_fails() {
    let tmpdir = tempfile::tempdir().unwrap();
    let out = forge(tmpdir.path(), &["plan"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("No project description found"));
}

#[test]
fn test_plan_json() {
    let tmpdir = tempfile::tempdir().unwrap();
    forge_core::storage::save(tmpdir.path(), &sample()).unwrap();

    let out = forge(tmpdir.path(), &["plan", "--json"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["order"], serde_json::json!(["Token", "Lexer", "Main"]));
    assert_eq!(json["stats"]["total_files"], 5);
    assert_eq!(json["stats"]["external_dependencies"], 1);
    assert_eq!(json["roots"], serde_json::json!(["Main"]));
}

#[test]
fn test_plan_reports_cycle() {
    let tmpdir = tempfile::tempdir().unwrap();
    let cyclic = ProjectDescription::from_modules(vec![ModuleDescriptor::new(
        "m",
        vec![
            FileDescriptor::new("A", false, &["B"]),
            FileDescriptor::new("B", false, &["A"]),
        ],
    )]);
    forge_core::storage::save(tmpdir.path(), &cyclic).unwrap();

    let out = forge(tmpdir.path(), &["plan"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("dependency cycle: A -> B -> A"));
}

#[test]
fn test_subtree_json() {
    let tmpdir = tempfile::tempdir().unwrap();
    forge_core::storage::save(tmpdir.path(), &sample()).unwrap();

    let out = forge(tmpdir.path(), &["subtree", "Lexer", "--json"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Token", "Lexer"]);
    assert_eq!(json[0]["kind"], "template");

    let missing = forge(tmpdir.path(), &["subtree", "<string>"]);
    assert!(!missing.status.success());
}

#[test]
fn test_import_then_materialize() {
    let tmpdir = tempfile::tempdir().unwrap();
    let file = tmpdir.path().join("design.json");
    std::fs::write(&file, sample().to_json().unwrap()).unwrap();

    let out = forge(tmpdir.path(), &["import", file.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(forge_core::storage::exists(tmpdir.path()));

    let out = forge(tmpdir.path(), &["materialize"]);
    assert!(out.status.success());
    for artifact in [
        "parsing/Token.tpp",
        "parsing/Lexer.hpp",
        "parsing/Lexer.cpp",
        "app/Main.hpp",
        "app/Main.cpp",
    ] {
        assert!(tmpdir.path().join(artifact).is_file(), "missing {artifact}");
    }

    // Second run creates nothing new.
    let again = forge(tmpdir.path(), &["materialize"]);
    assert!(again.status.success());
    assert!(String::from_utf8_lossy(&again.stdout).trim().is_empty());
}

#[test]
fn test_import_rejects_unresolved_dependency() {
    let tmpdir = tempfile::tempdir().unwrap();
    let file = tmpdir.path().join("design.json");
    std::fs::write(
        &file,
        r#"{"project": {"modules": [{"name": "m", "files": [{"name": "A", "is_template": false, "deps": ["Ghost"]}]}]}}"#,
    )
    .unwrap();

    let out = forge(tmpdir.path(), &["import", file.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Ghost"));
    assert!(!forge_core::storage::exists(tmpdir.path()));
}

#[test]
fn test_parse_json_from_file() {
    let tmpdir = tempfile::tempdir().unwrap();
    let log = tmpdir.path().join("build.log");
    std::fs::write(
        &log,
        "main.cpp:3:9: error: 'y' was not declared in this scope\nmain.cpp:1:5: warning: unused variable 'x'\n",
    )
    .unwrap();

    let out = forge(tmpdir.path(), &["parse", log.to_str().unwrap(), "--json"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["errors"].as_array().unwrap().len(), 1);
    assert_eq!(json["warnings"][0]["line"], 1);
}

#[test]
fn test_build_with_unknown_toolchain_fails() {
    let tmpdir = tempfile::tempdir().unwrap();
    std::fs::write(tmpdir.path().join("main.cpp"), "int main() { return 0; }").unwrap();

    let out = forge(tmpdir.path(), &["build", "--toolchain", "tcc", "--json"]);
    assert!(!out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["process_error"].as_str().unwrap().contains("unknown toolchain"));
}

#[test]
fn test_config_defaults_without_file() {
    let tmpdir = tempfile::tempdir().unwrap();
    let config = forge_core::config::ForgeConfig::load(tmpdir.path()).unwrap();
    assert_eq!(config.build.toolchain, "auto");
    assert_eq!(config.build.build_dir, Path::new("bin"));
    assert_eq!(config.layout.header_extension, "hpp");
}
