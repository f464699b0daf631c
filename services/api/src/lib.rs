mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use mero_jobs::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
