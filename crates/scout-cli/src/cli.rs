use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use scout_common::Mode;

#[derive(Parser)]
#[command(name = "scout", about = "Entity discovery & extraction runner")]
#[command(version)]
pub struct Cli {
    /// Path to the app config file consulted by lens precedence (spec
    /// section 6's `config/app.yaml:default_lens`).
    #[arg(long, global = true, default_value = "config/app.yaml")]
    pub config: PathBuf,

    /// Directory containing `<lens-id>.yaml` lens documents.
    #[arg(long, global = true, default_value = "lenses")]
    pub lens_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one discovery/extraction request.
    Run {
        /// The free-text query describing what to find.
        query: String,

        #[arg(long, value_enum, default_value_t = CliMode::DiscoverMany)]
        mode: CliMode,

        /// Hard cap on total spend across connectors, in USD.
        #[arg(long)]
        budget: Option<f64>,

        /// Lens id (overrides `LENS_ID` and `config/app.yaml:default_lens`).
        #[arg(long)]
        lens: Option<String>,

        /// Persist the final entities to the store.
        #[arg(long)]
        persist: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CliMode {
    ResolveOne,
    DiscoverMany,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::ResolveOne => Mode::ResolveOne,
            CliMode::DiscoverMany => Mode::DiscoverMany,
        }
    }
}
