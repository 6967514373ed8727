use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "tokenmint", about = "Per-user JWT issuance and refresh rotation")]
pub struct Cli {
    /// Path to a TOML settings file; defaults by build profile.
    #[arg(long)]
    pub settings: Option<String>,
}
