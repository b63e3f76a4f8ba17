//! CLI domain: parse, route, help, output, and presentation only.
//! No generation logic; a single route table dispatches to domain services.

mod help;
mod interactive;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, wants_warm_up};
pub use interactive::{menu_items, resolve_choice, split_prompts, MenuChoice};
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_backends_json, format_backends_text, format_batch_json, format_batch_text,
    format_probe_json, format_probe_text, format_progress_line, ConsoleProgress,
};
pub use route::RunContext;
