// tests/status_report.rs

use svdeploy::jobs::JobRegistry;
use svdeploy::supervisor::{parse_status_output, StatusQuery};
use svdeploy::types::ProcessState;

const REPORT: &str = "\
mix_server.0a1b2c:mix_server_00   RUNNING   pid 100, uptime 1:02:03
mix_server.0a1b2c:mix_server_01   STARTING
scheduler.0a1b2c:scheduler_00     FATAL     Exited too quickly (process log may have details)
mix_server.ffffff:mix_server_00   STOPPED   Oct 18 09:12 AM
other_app:other_app_00            RUNNING   pid 7, uptime 0:00:10
";

#[test]
fn every_known_row_is_parsed_in_order() {
    let rows = parse_status_output(REPORT, &JobRegistry::builtin());

    assert_eq!(rows.len(), 4);
    let targets: Vec<String> = rows.iter().map(|r| r.target()).collect();
    assert_eq!(
        targets,
        vec![
            "mix_server.0a1b2c:mix_server_00",
            "mix_server.0a1b2c:mix_server_01",
            "scheduler.0a1b2c:scheduler_00",
            "mix_server.ffffff:mix_server_00",
        ]
    );
    assert_eq!(rows[1].status, ProcessState::Starting);
    assert_eq!(rows[2].status, ProcessState::Fatal);
    assert_eq!(
        rows[2].description,
        "Exited too quickly (process log may have details)"
    );
}

#[test]
fn foreign_programs_only_is_no_jobs() {
    let q = StatusQuery::from_output(
        Some(0),
        "other_app:other_app_00   RUNNING   pid 7, uptime 0:00:10\n",
        &JobRegistry::builtin(),
    );
    assert_eq!(q, StatusQuery::NoJobs);
}

#[test]
fn unreachable_daemon_is_failed() {
    let q = StatusQuery::from_output(
        Some(7),
        "\nunix:///srv/app/tmp/sockets/supervisor.sock refused connection\n",
        &JobRegistry::builtin(),
    );
    match q {
        StatusQuery::Failed(reason) => assert!(reason.contains("refused connection")),
        other => panic!("Expected Failed, got {:?}", other),
    }
}

#[test]
fn killed_status_command_is_failed() {
    let q = StatusQuery::from_output(None, "", &JobRegistry::builtin());
    assert!(matches!(q, StatusQuery::Failed(_)));
}
