use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match consult_sweeper::cli::run_cli().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
