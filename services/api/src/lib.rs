mod cli;
mod infra;
mod process;
mod routes;
mod server;

use lawyer_score::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
