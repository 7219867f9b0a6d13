//! CLI tests for the built-in `clean` task.

use std::process::Command;

use chore::exit_codes;
use chore::test_support::TestProject;

const ARTIFACTS: &[&str] = &[
    ".venv/bin/python",
    "build/lib/contriboo/client.py",
    "dist/contriboo-0.1.0.tar.gz",
    "contriboo.egg-info/PKG-INFO",
    "src/contriboo.egg-info/SOURCES.txt",
    ".coverage",
    "htmlcov/index.html",
    ".pytest_cache/v/cache/nodeids",
    ".mypy_cache/3.12/contriboo.json",
    ".ruff_cache/CACHEDIR.TAG",
    "src/contriboo/__pycache__/client.cpython-312.pyc",
    "tests/__pycache__/test_client_api.cpython-312.pyc",
    "examples/stale.pyc",
];

fn clean(project: &TestProject) -> std::process::ExitStatus {
    Command::new(env!("CARGO_BIN_EXE_chore"))
        .current_dir(project.path())
        .arg("clean")
        .status()
        .expect("chore clean")
}

#[test]
fn clean_removes_every_artifact_and_keeps_sources() {
    let project = TestProject::new().expect("project");
    for artifact in ARTIFACTS {
        project.touch(artifact).expect("artifact");
    }
    project.touch("src/contriboo/client.py").expect("source");
    project.touch("tests/test_client_api.py").expect("test");

    let status = clean(&project);

    assert_eq!(status.code(), Some(exit_codes::OK));
    for artifact in ARTIFACTS {
        assert!(
            !project.path().join(artifact).exists(),
            "{artifact} should be removed"
        );
    }
    for dir in [".venv", "build", "dist", "htmlcov", "src/contriboo/__pycache__"] {
        assert!(!project.path().join(dir).exists(), "{dir} should be removed");
    }
    assert!(project.path().join("src/contriboo/client.py").exists());
    assert!(project.path().join("tests/test_client_api.py").exists());
}

#[test]
fn clean_is_idempotent_on_an_empty_project() {
    let project = TestProject::new().expect("project");

    assert_eq!(clean(&project).code(), Some(exit_codes::OK));
    assert_eq!(clean(&project).code(), Some(exit_codes::OK));
}

#[test]
fn clean_honors_custom_venv_dir() {
    let project = TestProject::new().expect("project");
    project
        .write_config("[vars]\nvenv_dir = \"env\"\n")
        .expect("config");
    project.touch("env/bin/python").expect("venv");
    project.touch(".venv/keep").expect("other dir");

    assert_eq!(clean(&project).code(), Some(exit_codes::OK));
    assert!(!project.path().join("env").exists());
    assert!(project.path().join(".venv/keep").exists());
}
