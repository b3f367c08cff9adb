pub mod coordinator;

pub use coordinator::{Coordinator, CoordinatorBuilder};

use crate::error::AppError;
use crate::frame::Frame;
use image::RgbImage;

/// Supplies raw frames of the watched display region. Pull-based and
/// synchronous; the acquire stage calls it in a tight loop.
pub trait CaptureSource: Send {
    fn grab(&mut self) -> Result<Frame, AppError>;
}

/// Presents annotated frames. Purely observational apart from the stop-key
/// poll; nothing feeds back into the pipeline.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &RgbImage) -> Result<(), AppError>;
    fn stop_requested(&mut self) -> bool;
}
