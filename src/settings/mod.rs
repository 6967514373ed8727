//! Process settings: a TOML file overlaid with `TOKENMINT__*` environment
//! variables, e.g. `TOKENMINT__JWT__MAX_REFRESH_COUNT=5`.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
