#![allow(dead_code)]

pub use svdeploy_test_utils::{builders, fake_runner, fake_supervisor, fast_wait, init_tracing};

use std::fs;
use std::path::{Path, PathBuf};

/// Write `content` to `dir/rel`, creating parent directories.
pub fn write_file(dir: &Path, rel: &str, content: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Application settings used across the renderer tests.
pub const APPLICATION_YML: &str = "\
database:
  user: deploy
  password: s3cret
  pool: 10
endpoint:
  host: example.org
  ssl: true
";

pub const PROD_EXS_TEMPLATE: &str = r#"config :app, App.Repo,
  username: <%= config["database.user"] %>,
  password: <%= config["database.password"] %>,
  pool_size: <%= config["database.pool"] %>

config :app, App.Endpoint,
  url: [host: <%= config["endpoint.host"] %>],
  force_ssl: <%= config["endpoint.ssl"] %>,
  secret: <%= config["endpoint.secret"] %>
"#;
