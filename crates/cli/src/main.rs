use std::process::ExitCode;

fn main() -> ExitCode {
    gavel_cli::run()
}
