use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    rankseries_lib::run().await
}
