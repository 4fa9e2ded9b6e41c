use std::process::ExitCode;

fn main() -> ExitCode {
    billgate_cli::run()
}
