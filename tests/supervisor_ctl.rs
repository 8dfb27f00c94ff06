// tests/supervisor_ctl.rs

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use crate::common::fake_runner::FakeRunner;
use svdeploy::errors::DeployError;
use svdeploy::exec::{CommandOutput, OutputMode};
use svdeploy::jobs::JobRegistry;
use svdeploy::supervisor::{StatusQuery, SupervisorControl, SupervisorCtl};
use svdeploy::types::ProcessState;

const STATUS: &str = "\
mix_server.abc123:mix_server_00   RUNNING   pid 100, uptime 1:02:03
scheduler.abc123:scheduler_00     STOPPED   Oct 18 09:12 AM
";

fn ctl(runner: &FakeRunner) -> SupervisorCtl {
    SupervisorCtl::new(
        Arc::new(runner.clone()),
        "supervisorctl",
        "supervisord",
        "tmp/supervisor.conf",
        "/srv/app",
        JobRegistry::builtin(),
    )
}

fn exited(code: i32, stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: stdout.to_string(),
    }
}

#[tokio::test]
async fn status_is_captured_and_run_against_the_config() {
    common::init_tracing();
    let runner = FakeRunner::new().respond("status", exited(0, STATUS));

    let query = ctl(&runner).status().await;

    assert_eq!(runner.lines(), vec!["supervisorctl -c tmp/supervisor.conf status"]);
    let spec = &runner.executed()[0];
    assert_eq!(spec.output, OutputMode::Capture);
    assert_eq!(spec.cwd, Some(PathBuf::from("/srv/app")));

    let rows = query.jobs();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].target(), "mix_server.abc123:mix_server_00");
    assert_eq!(rows[1].status, ProcessState::Stopped);
}

#[tokio::test]
async fn status_rows_count_even_on_non_zero_exit() {
    // supervisorctl exits 3 when any process is not running.
    let runner = FakeRunner::new().respond("status", exited(3, STATUS));

    let query = ctl(&runner).status().await;

    assert!(matches!(query, StatusQuery::Jobs(ref rows) if rows.len() == 2));
}

#[tokio::test]
async fn empty_status_with_zero_exit_means_no_jobs() {
    let runner = FakeRunner::new();

    assert_eq!(ctl(&runner).status().await, StatusQuery::NoJobs);
}

#[tokio::test]
async fn unreachable_daemon_is_reported_as_failed() {
    let runner = FakeRunner::new().respond(
        "status",
        exited(
            7,
            "unix:///srv/app/tmp/sockets/supervisor.sock no such file\n",
        ),
    );

    match ctl(&runner).status().await {
        StatusQuery::Failed(reason) => assert!(reason.contains("no such file"), "{reason}"),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn status_that_cannot_run_is_reported_as_failed() {
    let runner = FakeRunner::new().error_on("status", "supervisorctl: command not found");

    match ctl(&runner).status().await {
        StatusQuery::Failed(reason) => assert!(reason.contains("command not found"), "{reason}"),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(runner.lines().len(), 1);
}

#[tokio::test]
async fn control_commands_name_the_config_and_target() {
    let runner = FakeRunner::new();
    let ctl = ctl(&runner);

    ctl.start("mix_server.abc123:mix_server_00").await.unwrap();
    ctl.stop("all").await.unwrap();
    ctl.add("mix_server.def456").await.unwrap();
    ctl.remove("mix_server.abc123").await.unwrap();
    ctl.reload().await.unwrap();

    assert_eq!(
        runner.lines(),
        vec![
            "supervisorctl -c tmp/supervisor.conf start mix_server.abc123:mix_server_00",
            "supervisorctl -c tmp/supervisor.conf stop all",
            "supervisorctl -c tmp/supervisor.conf add mix_server.def456",
            "supervisorctl -c tmp/supervisor.conf remove mix_server.abc123",
            "supervisorctl -c tmp/supervisor.conf reload",
        ]
    );
    for spec in runner.executed() {
        assert_eq!(spec.cwd, Some(PathBuf::from("/srv/app")));
    }
}

#[tokio::test]
async fn failed_start_carries_command_and_exit_code() {
    let runner = FakeRunner::new().fail_on(" start ", 7);

    let err = ctl(&runner)
        .start("mix_server.abc123:mix_server_00")
        .await
        .unwrap_err();

    match err {
        DeployError::CommandFailed { command, code } => {
            assert_eq!(
                command,
                "supervisorctl -c tmp/supervisor.conf start mix_server.abc123:mix_server_00"
            );
            assert_eq!(code, 7);
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_reload_is_an_error() {
    let runner = FakeRunner::new().fail_on("reload", 2);

    let err = ctl(&runner).reload().await.unwrap_err();

    assert!(
        matches!(err, DeployError::CommandFailed { code: 2, ref command } if command.ends_with("reload")),
        "{err:?}"
    );
}

#[tokio::test]
async fn daemon_is_launched_with_its_own_binary() {
    let runner = FakeRunner::new();

    ctl(&runner).launch_daemon().await.unwrap();

    assert_eq!(runner.lines(), vec!["supervisord -c tmp/supervisor.conf"]);
    let spec = &runner.executed()[0];
    assert_eq!(spec.output, OutputMode::Inherit);
    assert_eq!(spec.cwd, Some(PathBuf::from("/srv/app")));
}
