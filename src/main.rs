use tankbot::error::AppError;
use tankbot::Configuration;
use tracing::Level;

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();

    let configuration = Configuration::default();
    configuration.validate().map_err(AppError::Config)?;
    tracing::info!("configuration validated; wire a capture source, frame sink and input backend into CoordinatorBuilder to run the bot");
    Ok(())
}
