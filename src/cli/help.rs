//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name string for log fields (e.g. "generate", "probe").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Interactive => "interactive",
        Commands::Generate { .. } => "generate",
        Commands::Backends { .. } => "backends",
        Commands::Probe { .. } => "probe",
        Commands::Config => "config",
    }
}

/// Whether the command dispatches real work and should warm backends up first.
pub fn wants_warm_up(command: &Commands) -> bool {
    matches!(command, Commands::Interactive | Commands::Generate { .. })
}
