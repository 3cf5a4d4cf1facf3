//! Port traits the domain and CLI talk to.

pub mod config_port;
pub mod report_port;
pub mod tick_port;
