mod commands;
mod error;
mod report;
mod terminal;

use std::process::ExitCode;

use commands::analyze::{self, Input};
use commands::{CommandLine, Commands};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();
    let opts = commands.options;

    logging::init(opts.verbose, opts.quiet);
    print::banner(opts.quiet);

    let input = match commands.command {
        Commands::File { path } => Input::File(path),
        Commands::List { domains } => Input::List(domains),
    };

    match analyze::analyze(input, &opts).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            cdnmap_common::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
