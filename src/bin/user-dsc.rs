use dsc_resources::cli::UserCli;
use dsc_resources::{commands, finish, logging, parse_args};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli: UserCli = match parse_args() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    logging::init(cli.verbosity.verbose, cli.verbosity.quiet);

    finish("user-dsc", commands::user::run(cli.command))
}
