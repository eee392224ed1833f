//! Command dispatch: bridges CLI args to the proto/config crates and output.

pub mod config_cmd;
pub mod decode;
pub mod encode;

use clap::CommandFactory;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

pub fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Encode(args) => encode::handle(&args, global),
        Command::Decode(args) => decode::handle(&args, global),
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "heatlink", &mut std::io::stdout());
            Ok(())
        }
    }
}
