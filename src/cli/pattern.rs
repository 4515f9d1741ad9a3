//! Pattern command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::utils::ConfigArgs;

#[derive(Args)]
pub struct PatternArgs {
    /// Directory to discover a config file in
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: PatternArgs) -> Result<()> {
    let config = args.config.load(&args.path, &args.config.overrides())?;
    println!("{}", config.search_pattern());
    Ok(())
}
