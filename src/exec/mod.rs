// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] describes an invocation (`CommandSpec`) and its result.
//! - [`process`] runs one invocation with `tokio::process::Command`.
//! - [`backend`] provides the `CommandRunner` trait and the concrete
//!   `ProcessRunner` used in production, which tests replace with a fake.

pub mod backend;
pub mod command;
pub mod process;

pub use backend::{run_checked, BoxFuture, CommandRunner, ProcessRunner};
pub use command::{CommandOutput, CommandSpec, OutputMode};
