mod cli;
mod commands;
mod formatting;
mod logging;
mod settings;

use std::process::ExitCode;

use commands::run_export;

#[tokio::main]
async fn main() -> ExitCode {
    let (args, flags) = cli::parse();
    logging::init(args.verbose);
    run_export(args, flags).await
}
