use thiserror::Error;

// Main application error type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Capture error: {0}")]
    Capture(String),
    #[error("Display error: {0}")]
    Display(String),
    #[error("Pipeline error: {0}")]
    Pipeline(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}
