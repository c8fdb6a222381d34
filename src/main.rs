use std::process::ExitCode;

fn main() -> ExitCode {
    match ubistage::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ubistage::ui::output::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
