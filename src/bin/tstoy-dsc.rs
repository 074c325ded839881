use dsc_resources::cli::SettingsCli;
use dsc_resources::{commands, finish, logging, parse_args};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli: SettingsCli = match parse_args() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    logging::init(cli.verbosity.verbose, cli.verbosity.quiet);

    finish("tstoy-dsc", commands::settings::run(cli.command))
}
