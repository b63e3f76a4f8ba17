//! Integration tests for the promptcast generation system

mod batch_fanout;
mod cli_commands;
mod config_integration;
mod retry_scenarios;
mod test_utils;
mod warm_up;

pub use test_utils::with_xdg_env;
