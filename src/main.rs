//! Main entry point for logdiff CLI

use clap::Parser;
use logdiff::cli::Cli;
use logdiff::commands::execute_command;

fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging at the level the flags ask for
    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level())
        .init();

    let options = cli.driver_options();
    match execute_command(cli.command, options) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
