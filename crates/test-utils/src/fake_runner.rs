use std::sync::{Arc, Mutex};

use svdeploy::errors::{DeployError, Result};
use svdeploy::exec::{BoxFuture, CommandOutput, CommandRunner, CommandSpec};

/// A fake command runner that:
/// - records every command it is asked to run
/// - fails to run commands matching an `error_on` needle
/// - answers with the first scripted output whose needle occurs in the
///   command line, or a successful empty output otherwise.
#[derive(Clone, Default)]
pub struct FakeRunner {
    executed: Arc<Mutex<Vec<CommandSpec>>>,
    scripted: Arc<Mutex<Vec<(String, CommandOutput)>>>,
    unrunnable: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose line contains `needle` with `output`.
    pub fn respond(self, needle: &str, output: CommandOutput) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .push((needle.to_string(), output));
        self
    }

    /// Make commands containing `needle` exit with `code`.
    pub fn fail_on(self, needle: &str, code: i32) -> Self {
        self.respond(
            needle,
            CommandOutput {
                code: Some(code),
                stdout: String::new(),
            },
        )
    }

    /// Make commands containing `needle` fail to run at all, the way a
    /// missing binary does.
    pub fn error_on(self, needle: &str, message: &str) -> Self {
        self.unrunnable
            .lock()
            .unwrap()
            .push((needle.to_string(), message.to_string()));
        self
    }

    pub fn executed(&self) -> Vec<CommandSpec> {
        self.executed.lock().unwrap().clone()
    }

    /// Recorded commands as the user would read them.
    pub fn lines(&self) -> Vec<String> {
        self.executed().iter().map(CommandSpec::display_line).collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> BoxFuture<'a, Result<CommandOutput>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(spec.clone());
            let line = spec.display_line();
            let error = self
                .unrunnable
                .lock()
                .unwrap()
                .iter()
                .find(|(needle, _)| line.contains(needle.as_str()))
                .map(|(_, message)| message.clone());
            if let Some(message) = error {
                return Err(DeployError::Other(anyhow::anyhow!(message)));
            }
            let output = self
                .scripted
                .lock()
                .unwrap()
                .iter()
                .find(|(needle, _)| line.contains(needle.as_str()))
                .map(|(_, out)| out.clone())
                .unwrap_or(CommandOutput {
                    code: Some(0),
                    stdout: String::new(),
                });
            Ok(output)
        })
    }
}
