use clap::{Parser, Subcommand};

use self::{auto_play::AutoPlayArg, dump_config::DumpConfigArg};

mod auto_play;
mod dump_config;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play seeded games with a bot and write a JSON report
    AutoPlay(#[clap(flatten)] AutoPlayArg),
    /// Write the default generator configuration as JSON
    DumpConfig(#[clap(flatten)] DumpConfigArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::AutoPlay(arg) => auto_play::run(&arg)?,
        Mode::DumpConfig(arg) => dump_config::run(&arg)?,
    }
    Ok(())
}
