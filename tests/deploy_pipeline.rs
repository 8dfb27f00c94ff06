// tests/deploy_pipeline.rs

mod common;
use crate::common::builders::ManifestBuilder;
use crate::common::fake_runner::FakeRunner;
use crate::common::fake_supervisor::{FakeSupervisor, SupervisorCall};
use crate::common::{init_tracing, APPLICATION_YML, PROD_EXS_TEMPLATE};

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use svdeploy::config::Manifest;
use svdeploy::deploy::{Deployer, ReconcileMode};
use svdeploy::errors::DeployError;
use svdeploy::fs::mock::MockFileSystem;
use svdeploy::fs::FileSystem;
use svdeploy::supervisor::{program_sections, StatusQuery};
use svdeploy::types::ProcessState;

type TestResult = Result<(), Box<dyn Error>>;

const BASE: &str = "/srv/app";

fn manifest() -> Manifest {
    ManifestBuilder::new()
        .without_templates()
        .with_template("shared/application.yml", "dply/config/prod.exs", "config/prod.exs")
        .supervisor_settings("shared/supervisor.yml")
        .build_steps(&["mix deps.get", "mix compile"])
        .fast_wait()
        .build()
}

fn checkout(scheduler: bool) -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/srv/app/shared/application.yml", APPLICATION_YML);
    fs.add_file("/srv/app/dply/config/prod.exs", PROD_EXS_TEMPLATE);
    fs.add_file(
        "/srv/app/shared/supervisor.yml",
        format!("scheduler: {scheduler}\n"),
    );
    fs
}

fn deployer(
    fs: &MockFileSystem,
    runner: &FakeRunner,
    fake: &FakeSupervisor,
    dry_run: bool,
) -> Deployer {
    Deployer::new(
        manifest(),
        BASE,
        Arc::new(fs.clone()),
        Arc::new(runner.clone()),
        Arc::new(fake.clone()),
        dry_run,
    )
}

#[tokio::test]
async fn first_deploy_builds_renders_and_cold_starts() -> TestResult {
    init_tracing();

    let fs = checkout(true);
    let runner = FakeRunner::new();
    let conf_path = PathBuf::from("/srv/app/tmp/supervisor.conf");
    let fake = FakeSupervisor::down().reading_conf(&fs, &conf_path);

    let report = deployer(&fs, &runner, &fake, false).deploy().await?;

    assert_eq!(
        runner.lines(),
        vec!["git pull origin master", "mix deps.get", "mix compile"]
    );
    let step = &runner.executed()[2];
    assert_eq!(step.cwd.as_deref(), Some(Path::new(BASE)));
    assert_eq!(step.env.get("MIX_ENV").map(String::as_str), Some("prod"));

    let rendered = fs.read_to_string(Path::new("/srv/app/config/prod.exs"))?;
    assert!(rendered.contains("username: \"deploy\","));
    assert_eq!(report.rendered.len(), 1);

    // Workspace
    assert!(fs.is_dir(Path::new("/srv/app/tmp/sockets")));
    assert!(fs.is_file(Path::new("/srv/app/log/scheduler.log")));

    // Supervisor config on disk matches what was rolled out.
    let written = fs.read_to_string(&conf_path)?;
    assert_eq!(written, report.restart.conf.text);
    assert_eq!(program_sections(&written)?, report.restart.conf.programs);
    assert_eq!(report.restart.conf.programs.len(), 2);

    assert_eq!(report.restart.planned, ReconcileMode::ColdStart);
    let reconciled = report.restart.reconciled.expect("reconciled");
    assert_eq!(reconciled.started.len(), 2);
    assert_eq!(fake.calls()[0], SupervisorCall::LaunchDaemon);
    assert!(fake.rows().iter().all(|r| r.status == ProcessState::Running));
    Ok(())
}

#[tokio::test]
async fn redeploy_reloads_onto_a_new_generation() -> TestResult {
    let fs = checkout(false);
    let runner = FakeRunner::new();
    let fake = FakeSupervisor::down().reading_conf(&fs, "/srv/app/tmp/supervisor.conf");
    let deployer = deployer(&fs, &runner, &fake, false);

    let first = deployer.restart().await?;
    let second = deployer.restart().await?;

    assert_ne!(first.conf.suffix, second.conf.suffix);
    assert!(matches!(second.existing, StatusQuery::Jobs(_)));
    assert_eq!(second.planned, ReconcileMode::RollingReload);

    let calls = fake.calls();
    assert_eq!(
        calls.iter().filter(|c| **c == SupervisorCall::LaunchDaemon).count(),
        1
    );
    assert_eq!(
        calls.iter().filter(|c| **c == SupervisorCall::Reload).count(),
        1
    );

    let names: Vec<String> = fake.rows().into_iter().map(|r| r.name).collect();
    assert_eq!(names, second.conf.programs);
    // Scheduler switched off: only the web server.
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("mix_server."));
    Ok(())
}

#[tokio::test]
async fn dry_run_touches_nothing() -> TestResult {
    let fs = checkout(true);
    let files_before = fs.file_paths();
    let runner = FakeRunner::new();
    let fake = FakeSupervisor::down();

    let report = deployer(&fs, &runner, &fake, true).deploy().await?;

    assert!(runner.executed().is_empty());
    assert!(fake.calls().is_empty());
    assert_eq!(fs.file_paths(), files_before);
    assert!(report.restart.reconciled.is_none());
    assert_eq!(report.restart.planned, ReconcileMode::ColdStart);
    assert_eq!(report.restart.conf.programs.len(), 2);
    Ok(())
}

#[tokio::test]
async fn failing_build_step_leaves_supervisor_alone() {
    let fs = checkout(false);
    let runner = FakeRunner::new().fail_on("mix compile", 1);
    let fake = FakeSupervisor::down();

    let err = deployer(&fs, &runner, &fake, false)
        .deploy()
        .await
        .unwrap_err();

    match err {
        DeployError::CommandFailed { command, code } => {
            assert_eq!(command, "mix compile");
            assert_eq!(code, 1);
        }
        other => panic!("Expected CommandFailed, got {:?}", other),
    }
    assert!(fake.calls().is_empty());
    assert!(fake.status_queries() == 0);
    assert!(!fs.exists(Path::new("/srv/app/tmp/supervisor.conf")));
}

#[tokio::test]
async fn missing_settings_file_means_no_scheduler() -> TestResult {
    let fs = MockFileSystem::new();
    let d = deployer(&fs, &FakeRunner::new(), &FakeSupervisor::down(), true);

    assert!(!d.scheduler_enabled()?);
    let report = d.restart().await?;
    assert_eq!(report.conf.programs.len(), 1);
    Ok(())
}

#[tokio::test]
async fn stop_targets_all_processes() -> TestResult {
    let fs = checkout(false);
    let fake = FakeSupervisor::down().reading_conf(&fs, "/srv/app/tmp/supervisor.conf");
    let d = deployer(&fs, &FakeRunner::new(), &fake, false);

    d.restart().await?;
    d.stop().await?;

    assert_eq!(fake.calls().last(), Some(&SupervisorCall::Stop("all".into())));
    assert!(fake.rows().iter().all(|r| r.status == ProcessState::Stopped));
    Ok(())
}
