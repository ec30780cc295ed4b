//! PoaBot Panel CLI entry point

use std::process::ExitCode;

use clap::Parser;

use poabot_panel::cli::{app::run, args::Cli, logging};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    run(cli).await
}
