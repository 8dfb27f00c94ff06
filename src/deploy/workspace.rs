// src/deploy/workspace.rs

//! Directories and seed log files the supervisor config points into.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::jobs::JobRegistry;

/// Directories (relative to the base dir) that must exist before the
/// daemon starts.
pub const WORKSPACE_DIRS: [&str; 4] = ["tmp", "log", "tmp/pids", "tmp/sockets"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceReport {
    pub created_dirs: Vec<PathBuf>,
    pub seeded_logs: Vec<PathBuf>,
}

/// Create missing workspace directories and seed missing log files.
///
/// Every registered job gets its log seeded, enabled or not, plus the
/// daemon's own `log/supervisord.log`. Existing files are left alone.
pub fn prepare_workspace(
    fs: &dyn FileSystem,
    base: &Path,
    registry: &JobRegistry,
    dry_run: bool,
) -> Result<WorkspaceReport> {
    let mut report = WorkspaceReport::default();

    for dir in WORKSPACE_DIRS {
        let path = base.join(dir);
        if fs.is_dir(&path) {
            continue;
        }
        if !dry_run {
            fs.create_dir_all(&path)?;
        }
        debug!(dir = ?path, dry_run, "created workspace dir");
        report.created_dirs.push(path);
    }

    let mut logs: Vec<(PathBuf, String)> = registry
        .jobs()
        .iter()
        .map(|j| (log_path(base, &j.log_file), j.name.clone()))
        .collect();
    logs.push((base.join("log/supervisord.log"), "supervisord".to_string()));

    for (path, name) in logs {
        if fs.exists(&path) {
            continue;
        }
        if !dry_run {
            fs.write(&path, format!("Starting {name} logs ... ").as_bytes())?;
        }
        report.seeded_logs.push(path);
    }

    info!(
        created_dirs = report.created_dirs.len(),
        seeded_logs = report.seeded_logs.len(),
        dry_run,
        "workspace prepared"
    );
    Ok(report)
}

/// Job log paths are written relative to the base dir with a leading `/`.
pub fn log_path(base: &Path, log_file: &str) -> PathBuf {
    base.join(log_file.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn creates_dirs_and_seeds_logs() {
        let fs = MockFileSystem::new();
        let base = Path::new("/srv/app");
        let report = prepare_workspace(&fs, base, &JobRegistry::builtin(), false).unwrap();

        assert_eq!(report.created_dirs.len(), 4);
        assert!(fs.is_dir(Path::new("/srv/app/tmp/sockets")));
        assert!(fs.is_dir(Path::new("/srv/app/tmp/pids")));
        assert_eq!(
            fs.read_to_string(Path::new("/srv/app/log/mix_server.log")).unwrap(),
            "Starting mix_server logs ... "
        );
        assert_eq!(
            fs.read_to_string(Path::new("/srv/app/log/scheduler.log")).unwrap(),
            "Starting scheduler logs ... "
        );
        assert_eq!(
            fs.read_to_string(Path::new("/srv/app/log/supervisord.log")).unwrap(),
            "Starting supervisord logs ... "
        );
    }

    #[test]
    fn existing_logs_are_not_truncated() {
        let fs = MockFileSystem::new();
        fs.add_file("/srv/app/log/mix_server.log", "old lines\n");
        let report =
            prepare_workspace(&fs, Path::new("/srv/app"), &JobRegistry::builtin(), false).unwrap();

        assert_eq!(
            fs.read_to_string(Path::new("/srv/app/log/mix_server.log")).unwrap(),
            "old lines\n"
        );
        assert!(!report
            .seeded_logs
            .contains(&PathBuf::from("/srv/app/log/mix_server.log")));
        // `log` already existed through the seeded file's parent.
        assert!(!report.created_dirs.contains(&PathBuf::from("/srv/app/log")));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let fs = MockFileSystem::new();
        let report =
            prepare_workspace(&fs, Path::new("/srv/app"), &JobRegistry::builtin(), true).unwrap();
        assert_eq!(report.seeded_logs.len(), 3);
        assert!(fs.file_paths().is_empty());
        assert!(!fs.exists(Path::new("/srv/app/tmp")));
    }
}
