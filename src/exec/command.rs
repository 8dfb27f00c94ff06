// src/exec/command.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// How a command's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Stdout is captured for parsing; stderr is drained into the log.
    Capture,
    /// Stdout and stderr go straight to the terminal (build tools).
    Inherit,
}

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub output: OutputMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            output: OutputMode::Inherit,
        }
    }

    /// A command line run through the platform shell.
    pub fn shell(line: impl Into<String>) -> Self {
        if cfg!(windows) {
            Self::new("cmd").arg("/C").arg(line)
        } else {
            Self::new("sh").arg("-c").arg(line)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn captured(mut self) -> Self {
        self.output = OutputMode::Capture;
        self
    }

    /// The user-facing command line, e.g. `supervisorctl -c tmp/supervisor.conf status`.
    ///
    /// Shell commands show the line they run, not the `sh -c` wrapper.
    pub fn display_line(&self) -> String {
        let is_shell = matches!(self.program.as_str(), "sh" | "cmd")
            && matches!(self.args.first().map(String::as_str), Some("-c" | "/C"))
            && self.args.len() == 2;
        if is_shell {
            return self.args[1].clone();
        }
        let mut line = self.program.clone();
        for a in self.args.iter() {
            line.push(' ');
            line.push_str(a);
        }
        line
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_line())
    }
}

/// Exit status and captured stdout of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Empty for [`OutputMode::Inherit`].
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code_or_minus_one(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}
