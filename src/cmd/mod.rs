//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`init`], or [`validate`]. Each handler
//! lives in its own submodule.

pub mod init;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::MockError;

pub async fn dispatch(cli: Cli) -> Result<(), MockError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(args).await,
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Validate(ref args)) => validate::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  mockroute v{version}: configuration-driven HTTP mock server\n\n  \
         No command provided. To get started:\n\n    \
         mockroute init                  Generate a starter config\n    \
         mockroute run                   Serve mocks (auto-detects ./mockroute.yaml)\n    \
         mockroute run -c mocks.yaml     Serve mocks from a specific config file\n    \
         mockroute --help                See all commands and options\n"
    );
}
