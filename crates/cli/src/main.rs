use std::process::ExitCode;

fn main() -> ExitCode {
    snapbill_cli::run()
}
