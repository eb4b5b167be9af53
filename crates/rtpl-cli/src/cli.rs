use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use rtpl_conf::Settings;

use crate::args::Args;
use crate::commands::Command;
use crate::commands::Project;
use crate::commands::RtplCommand;

/// Compile rtpl templates into Rust modules.
#[derive(Parser, Debug)]
#[command(name = "rtpl")]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: RtplCommand,

    #[command(flatten)]
    pub args: Args,
}

/// Parse CLI arguments, set up logging and execute the chosen command.
pub fn run<I, T>(args: I) -> Result<ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| {
        e.exit();
    });

    let current_dir = std::env::current_dir().context("Failed to read the current directory")?;
    let root = Utf8PathBuf::from_path_buf(current_dir)
        .map_err(|path| anyhow::anyhow!("Current directory is not UTF-8: {}", path.display()))?;
    let settings = Settings::new(&root).context("Failed to load settings")?;

    crate::logging::init_tracing(&cli.args.global, settings.debug);
    tracing::debug!(%root, ?settings, "loaded settings");

    let project = Project { root, settings };
    cli.command.execute(&project, &cli.args)
}
