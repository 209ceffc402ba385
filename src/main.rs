use clap::Parser;
use rotatrader::cli::{run, Cli};
use rotatrader::logging::init_logging;

fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();
    init_logging();
    run(Cli::parse())
}
