// src/supervisor/mod.rs

//! Everything that knows about supervisord.
//!
//! - [`conf`] generates the daemon's configuration document.
//! - [`status`] parses `supervisorctl status` into typed rows.
//! - [`ctl`] is the control seam (`SupervisorControl`) and its
//!   `supervisorctl`-backed implementation.

pub mod conf;
pub mod ctl;
pub mod status;

pub use conf::{
    generate, generate_with_suffix, program_sections, render_conf, socket_path, GeneratedConf,
    GroupSuffix,
};
pub use ctl::{SupervisorControl, SupervisorCtl};
pub use status::{parse_status_line, parse_status_output, ProcessStatus, StatusQuery};
