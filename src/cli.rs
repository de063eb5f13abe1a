use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "watchtest",
    version,
    about = "Re-run tests and checks when source files change"
)]
pub struct Cli {
    /// Config file (default: ./watchtest.toml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colored reports
    #[arg(long, global = true)]
    pub no_color: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Task to run (default: dev)
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the test commands once
    Test,
    /// Run the test commands, then re-run on every matching change
    #[command(name = "watch:test", alias = "watch")]
    WatchTest,
    /// Alias for watch:test
    Dev,
}

impl Command {
    /// Follows the alias chain: default -> dev -> watch:test.
    pub fn resolve(command: Option<Command>) -> Command {
        match command.unwrap_or(Command::Dev) {
            Command::Dev => Command::WatchTest,
            other => other,
        }
    }
}
