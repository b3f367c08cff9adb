pub mod config;
pub mod control;
pub mod detect;
pub mod error;
pub mod frame;
pub mod input;
pub mod pipeline;

pub use config::Configuration;
pub use detect::{Category, Detection, Point2};
pub use error::AppError;
pub use frame::Frame;
