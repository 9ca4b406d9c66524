//! Command execution: exit codes, clone reports and config init.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use rstest::rstest;
use tempfile::TempDir;

use protoclone::application::{ApplicationError, Check, DemoReport, Stage};
use protoclone::cli::commands::{clone_fixture, demo_outcome, execute_command, init_config};
use protoclone::cli::{Cli, CliError};
use protoclone::config::Settings;
use protoclone::domain::CloneDepth;
use protoclone::exitcode;
use protoclone::util::testing;

const FIXTURES: &str = "tests/resources/fixtures";

fn fixture(name: &str) -> PathBuf {
    Path::new(FIXTURES).join(name)
}

/// Local config that keeps output short; returned dir must outlive the run.
fn quiet_config() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("protoclone.toml");
    fs::write(&path, "show_tree = false\n").unwrap();
    (dir, path)
}

fn run(args: &[&str]) -> Result<(), CliError> {
    testing::init_test_setup();
    let cli = Cli::try_parse_from(args).expect("parse");
    execute_command(&cli)
}

// ============================================================
// execute_command
// ============================================================

#[test]
fn given_scenario_fixture_when_demo_then_succeeds() {
    let (_dir, config) = quiet_config();
    let config = config.to_string_lossy().to_string();
    let fixture = fixture("scenario.toml").to_string_lossy().to_string();

    let result = run(&["protoclone", "--config", &config, "demo", "--fixture", &fixture]);

    assert!(result.is_ok(), "{result:?}");
}

#[rstest]
#[case::shallow("shallow")]
#[case::deep("deep")]
fn given_linked_fixture_when_clone_then_succeeds(#[case] depth: &str) {
    let (_dir, config) = quiet_config();
    let config = config.to_string_lossy().to_string();
    let fixture = fixture("scenario.toml").to_string_lossy().to_string();

    let result = run(&[
        "protoclone", "--config", &config, "clone", "--depth", depth, "--fixture", &fixture,
    ]);

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn given_invalid_fixture_when_demo_then_dataerr() {
    let (_dir, config) = quiet_config();
    let config = config.to_string_lossy().to_string();
    let fixture = fixture("invalid.toml").to_string_lossy().to_string();

    let err = run(&["protoclone", "--config", &config, "demo", "--fixture", &fixture]).unwrap_err();

    assert!(matches!(
        err,
        CliError::Application(ApplicationError::Fixture { .. })
    ));
    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_missing_fixture_when_clone_then_noinput() {
    let (dir, config) = quiet_config();
    let config = config.to_string_lossy().to_string();
    let missing = dir.path().join("missing.toml").to_string_lossy().to_string();

    let err = run(&["protoclone", "--config", &config, "clone", "--fixture", &missing]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_broken_local_config_when_demo_then_config_exit_code() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("protoclone.toml");
    fs::write(&config, "depth = 3\n").unwrap();
    let config = config.to_string_lossy().to_string();

    let err = run(&["protoclone", "--config", &config, "demo"]).unwrap_err();

    assert!(matches!(
        err,
        CliError::Application(ApplicationError::Config { .. })
    ));
    assert_eq!(err.exit_code(), exitcode::CONFIG);
}

#[test]
fn given_no_subcommand_when_executed_then_ok() {
    assert!(run(&["protoclone"]).is_ok());
}

// ============================================================
// Demo outcome
// ============================================================

#[test]
fn given_report_with_failed_checks_when_evaluated_then_checks_failed() {
    let report = DemoReport {
        stages: vec![Stage {
            title: "deep clone".to_string(),
            graphs: vec![],
            checks: vec![
                Check {
                    label: "copy shares nothing with original".to_string(),
                    passed: false,
                },
                Check {
                    label: "scalar copied".to_string(),
                    passed: true,
                },
                Check {
                    label: "copy.backref.owner is copy".to_string(),
                    passed: false,
                },
            ],
        }],
    };

    let err = demo_outcome(&report).unwrap_err();

    assert!(matches!(err, CliError::ChecksFailed(2)));
    assert_eq!(err.exit_code(), exitcode::CHECKS_FAILED);
}

#[test]
fn given_passing_report_when_evaluated_then_ok() {
    assert!(demo_outcome(&DemoReport::default()).is_ok());
}

// ============================================================
// Clone report
// ============================================================

#[test]
fn given_shallow_clone_when_reporting_then_set_and_list_shared() {
    let report = clone_fixture(CloneDepth::Shallow, Some(&fixture("scenario.toml"))).expect("clone");

    assert_eq!(report.depth, CloneDepth::Shallow);
    assert_ne!(report.original, report.copy);
    assert_eq!(report.scalar, 23);
    assert_eq!(report.shared, vec!["Set#1 {1, 2, 3}", "List#2 [1, 2, 3]"]);
    assert_eq!(report.relinked, Some(true));
}

#[test]
fn given_deep_clone_when_reporting_then_nothing_shared() {
    let report = clone_fixture(CloneDepth::Deep, None).expect("clone");

    assert!(report.shared.is_empty());
    assert_eq!(report.original_objects, report.copy_objects);
    assert_eq!(report.relinked, Some(true));
    assert_eq!(report.original_tree, report.copy_tree);
}

#[test]
fn given_unlinked_fixture_when_reporting_then_relink_not_checked() {
    let report =
        clone_fixture(CloneDepth::Deep, Some(&fixture("unlinked.toml"))).expect("clone");

    assert_eq!(report.relinked, None);
}

// ============================================================
// Config init
// ============================================================

#[test]
fn given_no_config_when_init_then_template_written() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("protoclone.toml");

    init_config(&path, false).expect("init");

    assert_eq!(fs::read_to_string(&path).unwrap(), Settings::template());
}

#[test]
fn given_existing_config_when_init_without_force_then_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("protoclone.toml");
    fs::write(&path, "depth = \"shallow\"\n").unwrap();

    let err = init_config(&path, false).unwrap_err();

    assert!(matches!(err, CliError::InvalidArgs(_)));
    assert_eq!(err.exit_code(), exitcode::USAGE);
    assert_eq!(fs::read_to_string(&path).unwrap(), "depth = \"shallow\"\n");
}

#[test]
fn given_existing_config_when_init_with_force_then_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("protoclone.toml");
    fs::write(&path, "depth = \"shallow\"\n").unwrap();

    init_config(&path, true).expect("init --force");

    assert_eq!(fs::read_to_string(&path).unwrap(), Settings::template());
}
