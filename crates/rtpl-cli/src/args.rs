use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Do not print any output.
    #[arg(global = true, long, short, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Use verbose output. Repeat for more detail.
    #[arg(global = true, action = clap::ArgAction::Count, long, short, conflicts_with = "quiet")]
    pub verbose: u8,
}
