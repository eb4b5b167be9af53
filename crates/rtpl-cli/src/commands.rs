mod events;
mod generate;

use std::process::ExitCode;

use anyhow::Result;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use clap::Subcommand;
use rtpl_conf::Settings;

use crate::args::Args;

/// The project a command runs against: the working directory and the
/// settings layered from it.
#[derive(Debug)]
pub struct Project {
    pub root: Utf8PathBuf,
    pub settings: Settings,
}

impl Project {
    /// Template root, from `--templates` or `template_dir` relative to the project.
    pub fn template_dir(&self, templates: Option<&Utf8Path>) -> Utf8PathBuf {
        match templates {
            Some(dir) => self.root.join(dir),
            None => self.root.join(&self.settings.template_dir),
        }
    }
}

pub trait Command {
    fn execute(&self, project: &Project, args: &Args) -> Result<ExitCode>;
}

#[derive(Debug, Subcommand)]
pub enum RtplCommand {
    /// Generate Rust modules for one or more templates
    Generate(self::generate::Generate),
    /// Print the parsed header and body events of a template as JSON
    Events(self::events::Events),
}

impl Command for RtplCommand {
    fn execute(&self, project: &Project, args: &Args) -> Result<ExitCode> {
        match self {
            RtplCommand::Generate(command) => command.execute(project, args),
            RtplCommand::Events(command) => command.execute(project, args),
        }
    }
}
