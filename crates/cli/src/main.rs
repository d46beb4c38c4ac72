use std::process::ExitCode;

fn main() -> ExitCode {
    queuebot_cli::run()
}
