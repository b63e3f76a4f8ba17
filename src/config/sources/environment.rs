//! Environment source: PROMPTCAST__SECTION__KEY, applied last.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("PROMPTCAST")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
