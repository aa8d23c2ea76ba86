use candletrader::cli::{run, Cli};
use candletrader::logging::init_logging;
use clap::Parser;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json);
    run(cli)
}
