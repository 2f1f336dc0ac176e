use std::process::ExitCode;

fn main() -> ExitCode {
    velocity_cli::run()
}
